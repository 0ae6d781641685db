//! Attribute values and their canonical string forms.
//!
//! The wire and store representation of every attribute is a canonical
//! string (see the record grammar in `asic_net`). Parsing is directed by a
//! [`ValueKind`] because the string alone is ambiguous (`"1"` could be any
//! integer width). Serializing is total; `AttrValue::from_canon` inverts it
//! for every kind.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::oid::ObjectId;

/// Size of the fixed char block value.
pub const CHAR_DATA_LEN: usize = 32;

/// The value kind of an attribute, as declared by metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    Bool,
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    CharData,
    Mac,
    Ip4,
    Ip6,
    IpAddress,
    IpPrefix,
    U8List,
    U16List,
    U32List,
    I32List,
    VlanList,
    Oid,
    OidList,
    QosMapList,
    AclFieldU8,
    AclFieldU16,
    AclFieldU32,
    AclFieldMac,
    AclFieldIp4,
    AclFieldIp6,
    AclFieldOid,
    AclFieldOidList,
    AclActionU32,
    AclActionOid,
    AclActionOidList,
    Pointer,
}

impl ValueKind {
    /// Whether values of this kind can carry object ids.
    #[must_use]
    pub const fn holds_oids(self) -> bool {
        matches!(
            self,
            ValueKind::Oid
                | ValueKind::OidList
                | ValueKind::AclFieldOid
                | ValueKind::AclFieldOidList
                | ValueKind::AclActionOid
                | ValueKind::AclActionOidList
        )
    }
}

/// A MAC address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Mac(pub [u8; 6]);

impl std::fmt::Display for Mac {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let b = self.0;
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            b[0], b[1], b[2], b[3], b[4], b[5]
        )
    }
}

impl FromStr for Mac {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse = || -> Option<Mac> {
            let mut b = [0u8; 6];
            let mut parts = s.split(':');
            for slot in &mut b {
                *slot = u8::from_str_radix(parts.next()?, 16).ok()?;
            }
            parts.next().is_none().then_some(Mac(b))
        };
        parse().ok_or_else(|| ModelError::Parse {
            what: "mac",
            input: s.to_string(),
        })
    }
}

/// An IP prefix (address + mask length).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IpPrefix {
    pub addr: IpAddr,
    pub mask_len: u8,
}

impl IpPrefix {
    /// The longest valid mask for the address family.
    #[must_use]
    pub fn max_mask_len(addr: IpAddr) -> u8 {
        match addr {
            IpAddr::V4(_) => 32,
            IpAddr::V6(_) => 128,
        }
    }

    /// Whether this is a default (zero-length) prefix.
    #[must_use]
    pub fn is_default(&self) -> bool {
        self.mask_len == 0
    }
}

impl std::fmt::Display for IpPrefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.addr, self.mask_len)
    }
}

impl FromStr for IpPrefix {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ModelError::Parse {
            what: "ip prefix",
            input: s.to_string(),
        };
        let (addr, mask) = s.split_once('/').ok_or_else(err)?;
        let addr: IpAddr = addr.parse().map_err(|_| err())?;
        let mask_len: u8 = mask.parse().map_err(|_| err())?;
        if mask_len > IpPrefix::max_mask_len(addr) {
            return Err(err());
        }
        Ok(IpPrefix { addr, mask_len })
    }
}

/// One key/value pair of a qos map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QosMapItem {
    pub key: u32,
    pub value: u32,
}

/// Typed payload of an ACL field or action.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AclData {
    U8(u8),
    U16(u16),
    U32(u32),
    Mac(Mac),
    Ip4(Ipv4Addr),
    Ip6(Ipv6Addr),
    Oid(ObjectId),
    OidList(Vec<ObjectId>),
}

impl AclData {
    /// A zero value of the payload shape implied by an ACL value kind.
    fn zero_for(kind: ValueKind) -> AclData {
        match kind {
            ValueKind::AclFieldU8 => AclData::U8(0),
            ValueKind::AclFieldU16 => AclData::U16(0),
            ValueKind::AclFieldU32 | ValueKind::AclActionU32 => AclData::U32(0),
            ValueKind::AclFieldMac => AclData::Mac(Mac::default()),
            ValueKind::AclFieldIp4 => AclData::Ip4(Ipv4Addr::UNSPECIFIED),
            ValueKind::AclFieldIp6 => AclData::Ip6(Ipv6Addr::UNSPECIFIED),
            ValueKind::AclFieldOid | ValueKind::AclActionOid => AclData::Oid(ObjectId::NULL),
            ValueKind::AclFieldOidList | ValueKind::AclActionOidList => AclData::OidList(Vec::new()),
            _ => AclData::U32(0),
        }
    }

    fn to_canon(&self) -> String {
        match self {
            AclData::U8(v) => v.to_string(),
            AclData::U16(v) => v.to_string(),
            AclData::U32(v) => v.to_string(),
            AclData::Mac(m) => m.to_string(),
            AclData::Ip4(ip) => ip.to_string(),
            AclData::Ip6(ip) => ip.to_string(),
            AclData::Oid(oid) => oid.to_string(),
            AclData::OidList(list) => canon_list(list),
        }
    }

    fn from_canon(kind: ValueKind, s: &str) -> Result<AclData, ModelError> {
        let err = || ModelError::Parse {
            what: "acl data",
            input: s.to_string(),
        };
        Ok(match kind {
            ValueKind::AclFieldU8 => AclData::U8(parse_int(s)?),
            ValueKind::AclFieldU16 => AclData::U16(parse_int(s)?),
            ValueKind::AclFieldU32 | ValueKind::AclActionU32 => AclData::U32(parse_int(s)?),
            ValueKind::AclFieldMac => AclData::Mac(s.parse()?),
            ValueKind::AclFieldIp4 => AclData::Ip4(s.parse().map_err(|_| err())?),
            ValueKind::AclFieldIp6 => AclData::Ip6(s.parse().map_err(|_| err())?),
            ValueKind::AclFieldOid | ValueKind::AclActionOid => AclData::Oid(s.parse()?),
            ValueKind::AclFieldOidList | ValueKind::AclActionOidList => {
                AclData::OidList(parse_list(s, |e| e.parse())?)
            }
            _ => return Err(err()),
        })
    }

    /// Object ids carried by this payload.
    fn oids(&self) -> Vec<ObjectId> {
        match self {
            AclData::Oid(oid) => vec![*oid],
            AclData::OidList(list) => list.clone(),
            _ => Vec::new(),
        }
    }
}

/// ACL field: match enable flag, data and mask.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AclField {
    pub enable: bool,
    pub data: AclData,
    pub mask: AclData,
}

/// ACL action: enable flag and parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AclAction {
    pub enable: bool,
    pub parameter: AclData,
}

/// A typed attribute value: the closed variant the whole engine traffics in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttrValue {
    Bool(bool),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    I8(i8),
    I16(i16),
    I32(i32),
    CharData([u8; CHAR_DATA_LEN]),
    Mac(Mac),
    Ip4(Ipv4Addr),
    Ip6(Ipv6Addr),
    IpAddress(IpAddr),
    IpPrefix(IpPrefix),
    U8List(Vec<u8>),
    U16List(Vec<u16>),
    U32List(Vec<u32>),
    I32List(Vec<i32>),
    VlanList(Vec<u16>),
    Oid(ObjectId),
    OidList(Vec<ObjectId>),
    QosMapList(Vec<QosMapItem>),
    AclField(AclField),
    AclAction(AclAction),
    /// Opaque notification callback, carried by name only and never
    /// compared by value across the process boundary.
    Pointer(String),
}

fn canon_list<T: ToString>(list: &[T]) -> String {
    let mut out = format!("{}:", list.len());
    for (i, item) in list.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&item.to_string());
    }
    out
}

fn parse_list<T, E>(s: &str, parse: impl Fn(&str) -> Result<T, E>) -> Result<Vec<T>, ModelError> {
    let err = || ModelError::Parse {
        what: "list",
        input: s.to_string(),
    };
    let (count, body) = s.split_once(':').ok_or_else(err)?;
    let count: usize = count.parse().map_err(|_| err())?;
    // A null list pointer is serialized as "<count>:null" and carries no
    // elements.
    if body == "null" {
        return Ok(Vec::new());
    }
    if body.is_empty() {
        if count != 0 {
            return Err(err());
        }
        return Ok(Vec::new());
    }
    let items: Result<Vec<T>, E> = body.split(',').map(|e| parse(e)).collect();
    let items = items.map_err(|_| err())?;
    if items.len() != count {
        return Err(err());
    }
    Ok(items)
}

fn parse_int<T>(s: &str) -> Result<T, ModelError>
where
    T: FromStrRadix,
{
    let err = || ModelError::Parse {
        what: "integer",
        input: s.to_string(),
    };
    if let Some(hex) = s.strip_prefix("0x") {
        T::from_str_radix(hex, 16).map_err(|_| err())
    } else {
        T::from_str_radix(s, 10).map_err(|_| err())
    }
}

/// Integer parsing helper shared by every width.
trait FromStrRadix: Sized {
    fn from_str_radix(s: &str, radix: u32) -> Result<Self, std::num::ParseIntError>;
}

macro_rules! impl_from_str_radix {
    ($($ty:ty),*) => {$(
        impl FromStrRadix for $ty {
            fn from_str_radix(s: &str, radix: u32) -> Result<Self, std::num::ParseIntError> {
                <$ty>::from_str_radix(s, radix)
            }
        }
    )*};
}

impl_from_str_radix!(u8, u16, u32, u64, i8, i16, i32);

fn escape_char_data(bytes: &[u8]) -> String {
    let trimmed = match bytes.iter().rposition(|&b| b != 0) {
        Some(last) => &bytes[..=last],
        None => &[],
    };
    let mut out = String::new();
    for &b in trimmed {
        match b {
            b'\\' => out.push_str("\\\\"),
            0x20..=0x7e => out.push(b as char),
            _ => out.push_str(&format!("\\x{b:02X}")),
        }
    }
    out
}

fn unescape_char_data(s: &str) -> Result<[u8; CHAR_DATA_LEN], ModelError> {
    let err = || ModelError::Parse {
        what: "char data",
        input: s.to_string(),
    };
    let mut bytes = Vec::new();
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            if !c.is_ascii() {
                return Err(err());
            }
            bytes.push(c as u8);
            continue;
        }
        match chars.next() {
            Some('\\') => bytes.push(b'\\'),
            Some('x') => {
                let hi = chars.next().ok_or_else(err)?;
                let lo = chars.next().ok_or_else(err)?;
                let hex: String = [hi, lo].iter().collect();
                bytes.push(u8::from_str_radix(&hex, 16).map_err(|_| err())?);
            }
            _ => return Err(err()),
        }
    }
    if bytes.len() > CHAR_DATA_LEN {
        return Err(err());
    }
    let mut out = [0u8; CHAR_DATA_LEN];
    out[..bytes.len()].copy_from_slice(&bytes);
    Ok(out)
}

impl AttrValue {
    /// The kind of this value.
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        match self {
            AttrValue::Bool(_) => ValueKind::Bool,
            AttrValue::U8(_) => ValueKind::U8,
            AttrValue::U16(_) => ValueKind::U16,
            AttrValue::U32(_) => ValueKind::U32,
            AttrValue::U64(_) => ValueKind::U64,
            AttrValue::I8(_) => ValueKind::I8,
            AttrValue::I16(_) => ValueKind::I16,
            AttrValue::I32(_) => ValueKind::I32,
            AttrValue::CharData(_) => ValueKind::CharData,
            AttrValue::Mac(_) => ValueKind::Mac,
            AttrValue::Ip4(_) => ValueKind::Ip4,
            AttrValue::Ip6(_) => ValueKind::Ip6,
            AttrValue::IpAddress(_) => ValueKind::IpAddress,
            AttrValue::IpPrefix(_) => ValueKind::IpPrefix,
            AttrValue::U8List(_) => ValueKind::U8List,
            AttrValue::U16List(_) => ValueKind::U16List,
            AttrValue::U32List(_) => ValueKind::U32List,
            AttrValue::I32List(_) => ValueKind::I32List,
            AttrValue::VlanList(_) => ValueKind::VlanList,
            AttrValue::Oid(_) => ValueKind::Oid,
            AttrValue::OidList(_) => ValueKind::OidList,
            AttrValue::QosMapList(_) => ValueKind::QosMapList,
            AttrValue::AclField(f) => match f.data {
                AclData::U8(_) => ValueKind::AclFieldU8,
                AclData::U16(_) => ValueKind::AclFieldU16,
                AclData::U32(_) => ValueKind::AclFieldU32,
                AclData::Mac(_) => ValueKind::AclFieldMac,
                AclData::Ip4(_) => ValueKind::AclFieldIp4,
                AclData::Ip6(_) => ValueKind::AclFieldIp6,
                AclData::Oid(_) => ValueKind::AclFieldOid,
                AclData::OidList(_) => ValueKind::AclFieldOidList,
            },
            AttrValue::AclAction(a) => match a.parameter {
                AclData::Oid(_) => ValueKind::AclActionOid,
                AclData::OidList(_) => ValueKind::AclActionOidList,
                _ => ValueKind::AclActionU32,
            },
            AttrValue::Pointer(_) => ValueKind::Pointer,
        }
    }

    /// Every object id referenced by this value.
    ///
    /// Disabled ACL fields and actions reference nothing; their payload is
    /// not meaningful.
    #[must_use]
    pub fn oids(&self) -> Vec<ObjectId> {
        match self {
            AttrValue::Oid(oid) => vec![*oid],
            AttrValue::OidList(list) => list.clone(),
            AttrValue::AclField(f) if f.enable => f.data.oids(),
            AttrValue::AclAction(a) if a.enable => a.parameter.oids(),
            _ => Vec::new(),
        }
    }

    /// Rewrite every object id in place through `translate`.
    ///
    /// Used when moving a value across the identity boundary (VID to RID or
    /// back). Null ids are passed through untouched.
    pub fn map_oids<E>(
        &mut self,
        mut translate: impl FnMut(ObjectId) -> Result<ObjectId, E>,
    ) -> Result<(), E> {
        let mut map_one = |oid: &mut ObjectId| -> Result<(), E> {
            if !oid.is_null() {
                *oid = translate(*oid)?;
            }
            Ok(())
        };
        match self {
            AttrValue::Oid(oid) => map_one(oid)?,
            AttrValue::OidList(list) => {
                for oid in list {
                    map_one(oid)?;
                }
            }
            AttrValue::AclField(AclField { enable: true, data, .. })
            | AttrValue::AclAction(AclAction { enable: true, parameter: data }) => match data {
                AclData::Oid(oid) => map_one(oid)?,
                AclData::OidList(list) => {
                    for oid in list {
                        map_one(oid)?;
                    }
                }
                _ => {}
            },
            _ => {}
        }
        Ok(())
    }

    /// Produce the canonical string form.
    #[must_use]
    pub fn to_canon(&self) -> String {
        match self {
            AttrValue::Bool(v) => v.to_string(),
            AttrValue::U8(v) => v.to_string(),
            AttrValue::U16(v) => v.to_string(),
            AttrValue::U32(v) => v.to_string(),
            AttrValue::U64(v) => v.to_string(),
            AttrValue::I8(v) => v.to_string(),
            AttrValue::I16(v) => v.to_string(),
            AttrValue::I32(v) => v.to_string(),
            AttrValue::CharData(bytes) => escape_char_data(bytes),
            AttrValue::Mac(m) => m.to_string(),
            AttrValue::Ip4(ip) => ip.to_string(),
            AttrValue::Ip6(ip) => ip.to_string(),
            AttrValue::IpAddress(ip) => ip.to_string(),
            AttrValue::IpPrefix(p) => p.to_string(),
            AttrValue::U8List(list) => canon_list(list),
            AttrValue::U16List(list) => canon_list(list),
            AttrValue::U32List(list) => canon_list(list),
            AttrValue::I32List(list) => canon_list(list),
            AttrValue::VlanList(list) => canon_list(list),
            AttrValue::Oid(oid) => oid.to_string(),
            AttrValue::OidList(list) => canon_list(list),
            AttrValue::QosMapList(list) => {
                let items: Vec<String> = list
                    .iter()
                    .map(|i| format!("{}={}", i.key, i.value))
                    .collect();
                let mut out = format!("{}:", list.len());
                out.push_str(&items.join(","));
                out
            }
            AttrValue::AclField(f) => {
                if !f.enable {
                    return "disabled".to_string();
                }
                match f.data {
                    AclData::Oid(_) | AclData::OidList(_) => f.data.to_canon(),
                    _ => format!("{}&mask:{}", f.data.to_canon(), f.mask.to_canon()),
                }
            }
            AttrValue::AclAction(a) => {
                if !a.enable {
                    return "disabled".to_string();
                }
                a.parameter.to_canon()
            }
            AttrValue::Pointer(name) => name.clone(),
        }
    }

    /// Parse a canonical string back into a typed value.
    pub fn from_canon(kind: ValueKind, s: &str) -> Result<AttrValue, ModelError> {
        let err = || ModelError::Parse {
            what: "attribute value",
            input: s.to_string(),
        };
        Ok(match kind {
            ValueKind::Bool => match s {
                "true" => AttrValue::Bool(true),
                "false" => AttrValue::Bool(false),
                _ => return Err(err()),
            },
            ValueKind::U8 => AttrValue::U8(parse_int(s)?),
            ValueKind::U16 => AttrValue::U16(parse_int(s)?),
            ValueKind::U32 => AttrValue::U32(parse_int(s)?),
            ValueKind::U64 => AttrValue::U64(parse_int(s)?),
            ValueKind::I8 => AttrValue::I8(parse_int(s)?),
            ValueKind::I16 => AttrValue::I16(parse_int(s)?),
            ValueKind::I32 => AttrValue::I32(parse_int(s)?),
            ValueKind::CharData => AttrValue::CharData(unescape_char_data(s)?),
            ValueKind::Mac => AttrValue::Mac(s.parse()?),
            ValueKind::Ip4 => AttrValue::Ip4(s.parse().map_err(|_| err())?),
            ValueKind::Ip6 => AttrValue::Ip6(s.parse().map_err(|_| err())?),
            ValueKind::IpAddress => AttrValue::IpAddress(s.parse().map_err(|_| err())?),
            ValueKind::IpPrefix => AttrValue::IpPrefix(s.parse()?),
            ValueKind::U8List => AttrValue::U8List(parse_list(s, parse_int::<u8>)?),
            ValueKind::U16List => AttrValue::U16List(parse_list(s, parse_int::<u16>)?),
            ValueKind::U32List => AttrValue::U32List(parse_list(s, parse_int::<u32>)?),
            ValueKind::I32List => AttrValue::I32List(parse_list(s, parse_int::<i32>)?),
            ValueKind::VlanList => AttrValue::VlanList(parse_list(s, parse_int::<u16>)?),
            ValueKind::Oid => AttrValue::Oid(s.parse()?),
            ValueKind::OidList => AttrValue::OidList(parse_list(s, |e| e.parse())?),
            ValueKind::QosMapList => AttrValue::QosMapList(parse_list(s, |e| {
                let (k, v) = e.split_once('=').ok_or(())?;
                Ok::<QosMapItem, ()>(QosMapItem {
                    key: k.parse().map_err(|_| ())?,
                    value: v.parse().map_err(|_| ())?,
                })
            })?),
            ValueKind::AclFieldU8
            | ValueKind::AclFieldU16
            | ValueKind::AclFieldU32
            | ValueKind::AclFieldMac
            | ValueKind::AclFieldIp4
            | ValueKind::AclFieldIp6
            | ValueKind::AclFieldOid
            | ValueKind::AclFieldOidList => {
                if s == "disabled" {
                    AttrValue::AclField(AclField {
                        enable: false,
                        data: AclData::zero_for(kind),
                        mask: AclData::zero_for(kind),
                    })
                } else if matches!(kind, ValueKind::AclFieldOid | ValueKind::AclFieldOidList) {
                    AttrValue::AclField(AclField {
                        enable: true,
                        data: AclData::from_canon(kind, s)?,
                        mask: AclData::zero_for(kind),
                    })
                } else {
                    let (data, mask) = s.split_once("&mask:").ok_or_else(err)?;
                    AttrValue::AclField(AclField {
                        enable: true,
                        data: AclData::from_canon(kind, data)?,
                        mask: AclData::from_canon(kind, mask)?,
                    })
                }
            }
            ValueKind::AclActionU32 | ValueKind::AclActionOid | ValueKind::AclActionOidList => {
                if s == "disabled" {
                    AttrValue::AclAction(AclAction {
                        enable: false,
                        parameter: AclData::zero_for(kind),
                    })
                } else {
                    AttrValue::AclAction(AclAction {
                        enable: true,
                        parameter: AclData::from_canon(kind, s)?,
                    })
                }
            }
            ValueKind::Pointer => AttrValue::Pointer(s.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object_type::ObjectType;

    fn roundtrip(value: AttrValue) {
        let canon = value.to_canon();
        let back = AttrValue::from_canon(value.kind(), &canon).unwrap();
        assert_eq!(back, value, "canonical form was {canon:?}");
    }

    #[test]
    fn test_scalar_roundtrips() {
        roundtrip(AttrValue::Bool(true));
        roundtrip(AttrValue::U32(40000));
        roundtrip(AttrValue::U64(u64::MAX));
        roundtrip(AttrValue::I32(-7));
        roundtrip(AttrValue::Mac(Mac([0xaa, 0xbb, 0xcc, 0, 1, 2])));
        roundtrip(AttrValue::Ip4("10.0.0.1".parse().unwrap()));
        roundtrip(AttrValue::Ip6("2001:db8::1".parse().unwrap()));
        roundtrip(AttrValue::IpPrefix("10.0.0.0/24".parse().unwrap()));
    }

    #[test]
    fn test_hex_integer_accepted() {
        assert_eq!(
            AttrValue::from_canon(ValueKind::U32, "0x2a").unwrap(),
            AttrValue::U32(42)
        );
    }

    #[test]
    fn test_list_roundtrips() {
        roundtrip(AttrValue::U32List(vec![1, 2, 3]));
        roundtrip(AttrValue::U32List(Vec::new()));
        roundtrip(AttrValue::VlanList(vec![100, 200]));
        let vid = ObjectId::encode(0, ObjectType::Port, 1).unwrap();
        roundtrip(AttrValue::OidList(vec![vid, ObjectId::NULL]));
        roundtrip(AttrValue::QosMapList(vec![
            QosMapItem { key: 1, value: 5 },
            QosMapItem { key: 2, value: 6 },
        ]));
    }

    #[test]
    fn test_null_list_parses_empty() {
        assert_eq!(
            AttrValue::from_canon(ValueKind::U32List, "4:null").unwrap(),
            AttrValue::U32List(Vec::new())
        );
    }

    #[test]
    fn test_list_count_mismatch_rejected() {
        assert!(AttrValue::from_canon(ValueKind::U32List, "2:1,2,3").is_err());
    }

    #[test]
    fn test_char_data_escaping() {
        let mut raw = [0u8; CHAR_DATA_LEN];
        raw[..5].copy_from_slice(b"et\\h0");
        raw[5] = 0x01;
        let value = AttrValue::CharData(raw);
        let canon = value.to_canon();
        assert_eq!(canon, "et\\\\h0\\x01");
        roundtrip(value);
    }

    #[test]
    fn test_disabled_acl_action_is_disabled() {
        let action = AttrValue::AclAction(AclAction {
            enable: false,
            parameter: AclData::Oid(ObjectId::NULL),
        });
        assert_eq!(action.to_canon(), "disabled");
        let back = AttrValue::from_canon(ValueKind::AclActionOid, "disabled").unwrap();
        assert_eq!(back.to_canon(), "disabled");
    }

    #[test]
    fn test_acl_field_mask_roundtrip() {
        roundtrip(AttrValue::AclField(AclField {
            enable: true,
            data: AclData::U16(0x0800),
            mask: AclData::U16(0xffff),
        }));
    }

    #[test]
    fn test_oids_collects_only_enabled_acl_payloads() {
        let vid = ObjectId::encode(0, ObjectType::NextHop, 3).unwrap();
        let enabled = AttrValue::AclAction(AclAction {
            enable: true,
            parameter: AclData::Oid(vid),
        });
        let disabled = AttrValue::AclAction(AclAction {
            enable: false,
            parameter: AclData::Oid(vid),
        });
        assert_eq!(enabled.oids(), vec![vid]);
        assert!(disabled.oids().is_empty());
    }

    #[test]
    fn test_map_oids_rewrites_in_place() {
        let vid = ObjectId::encode(0, ObjectType::Port, 1).unwrap();
        let rid = ObjectId(0x99);
        let mut value = AttrValue::OidList(vec![vid, ObjectId::NULL]);
        value
            .map_oids(|oid| {
                assert_eq!(oid, vid);
                Ok::<_, ()>(rid)
            })
            .unwrap();
        assert_eq!(value, AttrValue::OidList(vec![rid, ObjectId::NULL]));
    }
}
