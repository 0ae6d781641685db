//! Structured keys for non-object-id entities.
//!
//! Route, neighbor, fdb and the other entry types are not identified by an
//! object id but by a tuple of key fields, some of which are themselves
//! virtual ids. The canonical form is a JSON object with alphabetically
//! ordered fields, e.g.
//! `{"dest":"10.0.0.0/24","switch_id":"oid:0x...","vr_id":"oid:0x..."}`.

use std::net::IpAddr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ModelError;
use crate::object_type::ObjectType;
use crate::oid::ObjectId;
use crate::value::{IpPrefix, Mac};

/// A structured entry key.
///
/// Each variant serializes deterministically; two keys are the same entry
/// exactly when their canonical strings are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryKey {
    Fdb {
        switch_id: ObjectId,
        mac: Mac,
        bv_id: ObjectId,
    },
    Neighbor {
        switch_id: ObjectId,
        rif_id: ObjectId,
        ip: IpAddr,
    },
    Route {
        switch_id: ObjectId,
        vr_id: ObjectId,
        dest: IpPrefix,
    },
    Inseg {
        switch_id: ObjectId,
        label: u32,
    },
    L2mc {
        switch_id: ObjectId,
        bv_id: ObjectId,
        destination: IpAddr,
        source: IpAddr,
    },
    Ipmc {
        switch_id: ObjectId,
        vr_id: ObjectId,
        destination: IpAddr,
        source: IpAddr,
    },
    McastFdb {
        switch_id: ObjectId,
        bv_id: ObjectId,
        mac: Mac,
    },
    Nat {
        switch_id: ObjectId,
        vr_id: ObjectId,
        proto: u8,
        src_ip: IpAddr,
        dst_ip: IpAddr,
    },
}

impl EntryKey {
    /// The object type this key belongs to.
    #[must_use]
    pub fn object_type(&self) -> ObjectType {
        match self {
            EntryKey::Fdb { .. } => ObjectType::FdbEntry,
            EntryKey::Neighbor { .. } => ObjectType::NeighborEntry,
            EntryKey::Route { .. } => ObjectType::RouteEntry,
            EntryKey::Inseg { .. } => ObjectType::InsegEntry,
            EntryKey::L2mc { .. } => ObjectType::L2mcEntry,
            EntryKey::Ipmc { .. } => ObjectType::IpmcEntry,
            EntryKey::McastFdb { .. } => ObjectType::McastFdbEntry,
            EntryKey::Nat { .. } => ObjectType::NatEntry,
        }
    }

    /// The object ids referenced by the key fields, `switch_id` first.
    #[must_use]
    pub fn oids(&self) -> Vec<ObjectId> {
        match self {
            EntryKey::Fdb { switch_id, bv_id, .. }
            | EntryKey::L2mc { switch_id, bv_id, .. }
            | EntryKey::McastFdb { switch_id, bv_id, .. } => vec![*switch_id, *bv_id],
            EntryKey::Neighbor { switch_id, rif_id, .. } => vec![*switch_id, *rif_id],
            EntryKey::Route { switch_id, vr_id, .. }
            | EntryKey::Ipmc { switch_id, vr_id, .. }
            | EntryKey::Nat { switch_id, vr_id, .. } => vec![*switch_id, *vr_id],
            EntryKey::Inseg { switch_id, .. } => vec![*switch_id],
        }
    }

    /// Rewrite every object id in the key through `translate`.
    pub fn map_oids<E>(
        &mut self,
        mut translate: impl FnMut(ObjectId) -> Result<ObjectId, E>,
    ) -> Result<(), E> {
        let slots: Vec<&mut ObjectId> = match self {
            EntryKey::Fdb { switch_id, bv_id, .. }
            | EntryKey::L2mc { switch_id, bv_id, .. }
            | EntryKey::McastFdb { switch_id, bv_id, .. } => vec![switch_id, bv_id],
            EntryKey::Neighbor { switch_id, rif_id, .. } => vec![switch_id, rif_id],
            EntryKey::Route { switch_id, vr_id, .. }
            | EntryKey::Ipmc { switch_id, vr_id, .. }
            | EntryKey::Nat { switch_id, vr_id, .. } => vec![switch_id, vr_id],
            EntryKey::Inseg { switch_id, .. } => vec![switch_id],
        };
        for slot in slots {
            if !slot.is_null() {
                *slot = translate(*slot)?;
            }
        }
        Ok(())
    }

    /// Produce the canonical JSON form (fields in alphabetical order).
    #[must_use]
    pub fn to_canon(&self) -> String {
        let mut map = Map::new();
        let mut put = |k: &str, v: String| {
            map.insert(k.to_string(), Value::String(v));
        };
        match self {
            EntryKey::Fdb { switch_id, mac, bv_id } => {
                put("bv_id", bv_id.to_string());
                put("mac", mac.to_string());
                put("switch_id", switch_id.to_string());
            }
            EntryKey::Neighbor { switch_id, rif_id, ip } => {
                put("ip", ip.to_string());
                put("rif_id", rif_id.to_string());
                put("switch_id", switch_id.to_string());
            }
            EntryKey::Route { switch_id, vr_id, dest } => {
                put("dest", dest.to_string());
                put("switch_id", switch_id.to_string());
                put("vr_id", vr_id.to_string());
            }
            EntryKey::Inseg { switch_id, label } => {
                put("label", label.to_string());
                put("switch_id", switch_id.to_string());
            }
            EntryKey::L2mc { switch_id, bv_id, destination, source } => {
                put("bv_id", bv_id.to_string());
                put("destination", destination.to_string());
                put("source", source.to_string());
                put("switch_id", switch_id.to_string());
            }
            EntryKey::Ipmc { switch_id, vr_id, destination, source } => {
                put("destination", destination.to_string());
                put("source", source.to_string());
                put("switch_id", switch_id.to_string());
                put("vr_id", vr_id.to_string());
            }
            EntryKey::McastFdb { switch_id, bv_id, mac } => {
                put("bv_id", bv_id.to_string());
                put("mac", mac.to_string());
                put("switch_id", switch_id.to_string());
            }
            EntryKey::Nat { switch_id, vr_id, proto, src_ip, dst_ip } => {
                put("dst_ip", dst_ip.to_string());
                put("proto", proto.to_string());
                put("src_ip", src_ip.to_string());
                put("switch_id", switch_id.to_string());
                put("vr_id", vr_id.to_string());
            }
        }
        Value::Object(map).to_string()
    }

    /// Parse a canonical JSON key for the given entry type.
    pub fn from_canon(object_type: ObjectType, s: &str) -> Result<EntryKey, ModelError> {
        let err = || ModelError::Parse {
            what: "entry key",
            input: s.to_string(),
        };
        let value: Value = serde_json::from_str(s).map_err(|_| err())?;
        let map = value.as_object().ok_or_else(err)?;
        let field = |name: &str| -> Result<&str, ModelError> {
            map.get(name).and_then(Value::as_str).ok_or_else(err)
        };
        let oid = |name: &str| -> Result<ObjectId, ModelError> { field(name)?.parse() };

        Ok(match object_type {
            ObjectType::FdbEntry => EntryKey::Fdb {
                switch_id: oid("switch_id")?,
                mac: field("mac")?.parse()?,
                bv_id: oid("bv_id")?,
            },
            ObjectType::NeighborEntry => EntryKey::Neighbor {
                switch_id: oid("switch_id")?,
                rif_id: oid("rif_id")?,
                ip: field("ip")?.parse().map_err(|_| err())?,
            },
            ObjectType::RouteEntry => EntryKey::Route {
                switch_id: oid("switch_id")?,
                vr_id: oid("vr_id")?,
                dest: field("dest")?.parse()?,
            },
            ObjectType::InsegEntry => EntryKey::Inseg {
                switch_id: oid("switch_id")?,
                label: field("label")?.parse().map_err(|_| err())?,
            },
            ObjectType::L2mcEntry => EntryKey::L2mc {
                switch_id: oid("switch_id")?,
                bv_id: oid("bv_id")?,
                destination: field("destination")?.parse().map_err(|_| err())?,
                source: field("source")?.parse().map_err(|_| err())?,
            },
            ObjectType::IpmcEntry => EntryKey::Ipmc {
                switch_id: oid("switch_id")?,
                vr_id: oid("vr_id")?,
                destination: field("destination")?.parse().map_err(|_| err())?,
                source: field("source")?.parse().map_err(|_| err())?,
            },
            ObjectType::McastFdbEntry => EntryKey::McastFdb {
                switch_id: oid("switch_id")?,
                bv_id: oid("bv_id")?,
                mac: field("mac")?.parse()?,
            },
            ObjectType::NatEntry => EntryKey::Nat {
                switch_id: oid("switch_id")?,
                vr_id: oid("vr_id")?,
                proto: field("proto")?.parse().map_err(|_| err())?,
                src_ip: field("src_ip")?.parse().map_err(|_| err())?,
                dst_ip: field("dst_ip")?.parse().map_err(|_| err())?,
            },
            _ => return Err(err()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vid(ot: ObjectType, n: u64) -> ObjectId {
        ObjectId::encode(0, ot, n).unwrap()
    }

    #[test]
    fn test_route_canonical_roundtrip() {
        let key = EntryKey::Route {
            switch_id: vid(ObjectType::Switch, 1),
            vr_id: vid(ObjectType::VirtualRouter, 1),
            dest: "10.0.0.0/24".parse().unwrap(),
        };
        let canon = key.to_canon();
        assert!(canon.starts_with("{\"dest\":\"10.0.0.0/24\""));
        let back = EntryKey::from_canon(ObjectType::RouteEntry, &canon).unwrap();
        assert_eq!(back, key);
    }

    #[test]
    fn test_fdb_canonical_field_order() {
        let key = EntryKey::Fdb {
            switch_id: vid(ObjectType::Switch, 1),
            mac: "AA:BB:CC:DD:EE:FF".parse().unwrap(),
            bv_id: vid(ObjectType::Vlan, 2),
        };
        let canon = key.to_canon();
        let bv = canon.find("bv_id").unwrap();
        let mac = canon.find("mac").unwrap();
        let sw = canon.find("switch_id").unwrap();
        assert!(bv < mac && mac < sw, "fields must be alphabetical: {canon}");
        assert_eq!(EntryKey::from_canon(ObjectType::FdbEntry, &canon).unwrap(), key);
    }

    #[test]
    fn test_all_entry_kinds_roundtrip() {
        let sw = vid(ObjectType::Switch, 1);
        let keys = [
            EntryKey::Neighbor {
                switch_id: sw,
                rif_id: vid(ObjectType::RouterInterface, 4),
                ip: "192.168.1.1".parse().unwrap(),
            },
            EntryKey::Inseg { switch_id: sw, label: 3000 },
            EntryKey::L2mc {
                switch_id: sw,
                bv_id: vid(ObjectType::Vlan, 9),
                destination: "230.1.1.1".parse().unwrap(),
                source: "0.0.0.0".parse().unwrap(),
            },
            EntryKey::Ipmc {
                switch_id: sw,
                vr_id: vid(ObjectType::VirtualRouter, 1),
                destination: "ff0e::1".parse().unwrap(),
                source: "::".parse().unwrap(),
            },
            EntryKey::McastFdb {
                switch_id: sw,
                bv_id: vid(ObjectType::Vlan, 9),
                mac: "01:00:5E:00:00:01".parse().unwrap(),
            },
            EntryKey::Nat {
                switch_id: sw,
                vr_id: vid(ObjectType::VirtualRouter, 1),
                proto: 6,
                src_ip: "10.1.1.1".parse().unwrap(),
                dst_ip: "10.2.2.2".parse().unwrap(),
            },
        ];
        for key in keys {
            let back = EntryKey::from_canon(key.object_type(), &key.to_canon()).unwrap();
            assert_eq!(back, key);
        }
    }

    #[test]
    fn test_key_oids_and_translation() {
        let sw = vid(ObjectType::Switch, 1);
        let vr = vid(ObjectType::VirtualRouter, 1);
        let mut key = EntryKey::Route {
            switch_id: sw,
            vr_id: vr,
            dest: "0.0.0.0/0".parse().unwrap(),
        };
        assert_eq!(key.oids(), vec![sw, vr]);

        key.map_oids(|oid| Ok::<_, ()>(ObjectId(oid.0 + 1))).unwrap();
        assert_eq!(key.oids(), vec![ObjectId(sw.0 + 1), ObjectId(vr.0 + 1)]);
    }

    #[test]
    fn test_wrong_type_rejected() {
        let key = EntryKey::Inseg {
            switch_id: vid(ObjectType::Switch, 1),
            label: 5,
        };
        assert!(EntryKey::from_canon(ObjectType::RouteEntry, &key.to_canon()).is_err());
    }
}
