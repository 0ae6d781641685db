//! Object identifiers and the virtual/real identity layer.
//!
//! A virtual id (VID) is minted locally without a driver round-trip and
//! decodes by pure bit arithmetic into `[switch index : 8][object type : 8]
//! [per-type counter : 48]`. A real id (RID) is whatever opaque handle the
//! vendor driver returned for the same object; the two are tied together by
//! a bijective [`IdMap`] per switch.

use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::object_type::ObjectType;

/// Number of bits in the per-type counter field.
const COUNTER_BITS: u64 = 48;
/// Mask for the counter field.
const COUNTER_MASK: u64 = (1 << COUNTER_BITS) - 1;

/// An opaque 64-bit object handle.
///
/// The same carrier is used for virtual ids (produced by [`VidAllocator`],
/// decodable) and real ids (produced by the driver, uninterpreted); the
/// [`Vid`] and [`Rid`] aliases document which side of the map a given slot
/// holds. The canonical string form is `oid:0x<hex>`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct ObjectId(pub u64);

/// A virtual id: locally minted, decodable.
pub type Vid = ObjectId;

/// A real id: driver-assigned, opaque.
pub type Rid = ObjectId;

impl ObjectId {
    /// The null object id.
    pub const NULL: ObjectId = ObjectId(0);

    /// Returns `true` for the null id.
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Encode a virtual id from its fields.
    ///
    /// # Errors
    ///
    /// Fails when the counter exceeds 48 bits or the type is `Null`.
    pub fn encode(
        switch_index: u8,
        object_type: ObjectType,
        counter: u64,
    ) -> Result<Vid, ModelError> {
        if object_type == ObjectType::Null {
            return Err(ModelError::InvalidObjectTypeByte(0));
        }
        if counter > COUNTER_MASK {
            return Err(ModelError::CounterOverflow(object_type));
        }
        Ok(ObjectId(
            (u64::from(switch_index) << 56) | ((object_type as u64) << COUNTER_BITS) | counter,
        ))
    }

    /// The object type encoded in a virtual id.
    ///
    /// The null id decodes to [`ObjectType::Null`]; an unknown type byte is
    /// an error (a corrupted or foreign id).
    pub fn object_type(self) -> Result<ObjectType, ModelError> {
        if self.is_null() {
            return Ok(ObjectType::Null);
        }
        ObjectType::from_raw(((self.0 >> COUNTER_BITS) & 0xff) as u8)
    }

    /// The switch index encoded in a virtual id (0 for null).
    #[must_use]
    pub const fn switch_index(self) -> u8 {
        (self.0 >> 56) as u8
    }

    /// The per-type counter encoded in a virtual id.
    #[must_use]
    pub const fn counter(self) -> u64 {
        self.0 & COUNTER_MASK
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "oid:0x{:x}", self.0)
    }
}

impl FromStr for ObjectId {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s
            .strip_prefix("oid:0x")
            .ok_or_else(|| ModelError::Parse {
                what: "object id",
                input: s.to_string(),
            })?;
        if hex.is_empty() || hex.len() > 16 {
            return Err(ModelError::Parse {
                what: "object id",
                input: s.to_string(),
            });
        }
        u64::from_str_radix(hex, 16)
            .map(ObjectId)
            .map_err(|_| ModelError::Parse {
                what: "object id",
                input: s.to_string(),
            })
    }
}

/// Mints virtual ids for one switch.
///
/// Counters are monotonic per object type and never reused within a process
/// lifetime. After hydrating persisted state, [`VidAllocator::advance_past`]
/// must be called for every historical id so freshly minted ids cannot
/// collide with them.
#[derive(Debug)]
pub struct VidAllocator {
    switch_index: u8,
    counters: HashMap<ObjectType, u64>,
}

impl VidAllocator {
    /// Create an allocator for the given switch index.
    #[must_use]
    pub fn new(switch_index: u8) -> Self {
        Self {
            switch_index,
            counters: HashMap::new(),
        }
    }

    /// The switch index this allocator mints for.
    #[must_use]
    pub fn switch_index(&self) -> u8 {
        self.switch_index
    }

    /// Mint a fresh virtual id for the given object type.
    pub fn allocate(&mut self, object_type: ObjectType) -> Result<Vid, ModelError> {
        let counter = self.counters.entry(object_type).or_insert(0);
        *counter += 1;
        ObjectId::encode(self.switch_index, object_type, *counter)
    }

    /// Advance the per-type counter past an existing id.
    ///
    /// Ids belonging to other switches are ignored.
    pub fn advance_past(&mut self, vid: Vid) -> Result<(), ModelError> {
        if vid.is_null() || vid.switch_index() != self.switch_index {
            return Ok(());
        }
        let ot = vid.object_type()?;
        let counter = self.counters.entry(ot).or_insert(0);
        *counter = (*counter).max(vid.counter());
        Ok(())
    }
}

/// Bidirectional VID ↔ RID map for one switch.
///
/// Both directions are kept in lock-step; [`IdMap::from_pairs`] verifies
/// that a persisted pair set actually is a bijection before accepting it.
#[derive(Debug, Default, Clone)]
pub struct IdMap {
    vid_to_rid: HashMap<Vid, Rid>,
    rid_to_vid: HashMap<Rid, Vid>,
}

impl IdMap {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a map from persisted `(vid, rid)` pairs, verifying
    /// injectivity in both directions.
    pub fn from_pairs<I>(pairs: I) -> Result<Self, ModelError>
    where
        I: IntoIterator<Item = (Vid, Rid)>,
    {
        let mut map = Self::new();
        for (vid, rid) in pairs {
            map.bind(vid, rid)?;
        }
        Ok(map)
    }

    /// Bind a VID to its RID.
    ///
    /// Rebinding an existing pair to the same counterpart is a no-op;
    /// binding either side to a different counterpart is an error.
    pub fn bind(&mut self, vid: Vid, rid: Rid) -> Result<(), ModelError> {
        match (self.vid_to_rid.get(&vid), self.rid_to_vid.get(&rid)) {
            (None, None) => {
                self.vid_to_rid.insert(vid, rid);
                self.rid_to_vid.insert(rid, vid);
                Ok(())
            }
            (Some(&r), Some(&v)) if r == rid && v == vid => Ok(()),
            _ => Err(ModelError::DuplicateBinding(format!(
                "vid {vid} rid {rid}"
            ))),
        }
    }

    /// Forget a VID and its RID.
    pub fn unbind(&mut self, vid: Vid) -> Option<Rid> {
        let rid = self.vid_to_rid.remove(&vid)?;
        self.rid_to_vid.remove(&rid);
        Some(rid)
    }

    /// Look up the RID for a VID.
    #[must_use]
    pub fn rid(&self, vid: Vid) -> Option<Rid> {
        self.vid_to_rid.get(&vid).copied()
    }

    /// Look up the VID for a RID.
    #[must_use]
    pub fn vid(&self, rid: Rid) -> Option<Vid> {
        self.rid_to_vid.get(&rid).copied()
    }

    /// Number of bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vid_to_rid.len()
    }

    /// Returns `true` when no bindings exist.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vid_to_rid.is_empty()
    }

    /// Iterate over `(vid, rid)` pairs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (Vid, Rid)> + '_ {
        self.vid_to_rid.iter().map(|(v, r)| (*v, *r))
    }

    /// Verify that a second pair set (the reverse hash as persisted) is the
    /// exact inverse of this map. Any discrepancy is fatal for startup.
    pub fn verify_inverse<I>(&self, reverse_pairs: I) -> Result<(), ModelError>
    where
        I: IntoIterator<Item = (Rid, Vid)>,
    {
        let mut seen = 0usize;
        for (rid, vid) in reverse_pairs {
            seen += 1;
            if self.rid(vid) != Some(rid) {
                return Err(ModelError::InconsistentIdMap(format!(
                    "reverse entry rid {rid} -> vid {vid} has no forward counterpart"
                )));
            }
        }
        if seen != self.len() {
            return Err(ModelError::InconsistentIdMap(format!(
                "forward map has {} entries, reverse has {seen}",
                self.len()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode_roundtrip() {
        for (sw, ot, n) in [
            (0u8, ObjectType::Port, 1u64),
            (3, ObjectType::RouteEntry, 0xffff_ffff),
            (255, ObjectType::Queue, COUNTER_MASK),
        ] {
            let vid = ObjectId::encode(sw, ot, n).unwrap();
            assert_eq!(vid.switch_index(), sw);
            assert_eq!(vid.object_type().unwrap(), ot);
            assert_eq!(vid.counter(), n);
        }
    }

    #[test]
    fn test_null_decodes_to_null_type() {
        assert_eq!(ObjectId::NULL.object_type().unwrap(), ObjectType::Null);
        assert_eq!(ObjectId::NULL.switch_index(), 0);
    }

    #[test]
    fn test_counter_overflow_rejected() {
        let err = ObjectId::encode(0, ObjectType::Port, COUNTER_MASK + 1);
        assert!(matches!(err, Err(ModelError::CounterOverflow(_))));
    }

    #[test]
    fn test_display_parse_roundtrip() {
        let vid = ObjectId::encode(1, ObjectType::Vlan, 42).unwrap();
        let s = vid.to_string();
        assert!(s.starts_with("oid:0x"));
        assert_eq!(s.parse::<ObjectId>().unwrap(), vid);
        assert_eq!("oid:0x0".parse::<ObjectId>().unwrap(), ObjectId::NULL);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("0x1234".parse::<ObjectId>().is_err());
        assert!("oid:0x".parse::<ObjectId>().is_err());
        assert!("oid:0x12345678123456781".parse::<ObjectId>().is_err());
    }

    #[test]
    fn test_allocator_monotonic_per_type() {
        let mut alloc = VidAllocator::new(0);
        let a = alloc.allocate(ObjectType::Port).unwrap();
        let b = alloc.allocate(ObjectType::Port).unwrap();
        let c = alloc.allocate(ObjectType::Vlan).unwrap();
        assert_eq!(a.counter(), 1);
        assert_eq!(b.counter(), 2);
        assert_eq!(c.counter(), 1);
        assert_ne!(b, c);
    }

    #[test]
    fn test_allocator_advances_past_persisted_ids() {
        let mut alloc = VidAllocator::new(0);
        let old = ObjectId::encode(0, ObjectType::Port, 100).unwrap();
        alloc.advance_past(old).unwrap();
        let fresh = alloc.allocate(ObjectType::Port).unwrap();
        assert_eq!(fresh.counter(), 101);
    }

    #[test]
    fn test_allocator_ignores_other_switch() {
        let mut alloc = VidAllocator::new(0);
        let foreign = ObjectId::encode(7, ObjectType::Port, 500).unwrap();
        alloc.advance_past(foreign).unwrap();
        assert_eq!(alloc.allocate(ObjectType::Port).unwrap().counter(), 1);
    }

    #[test]
    fn test_id_map_bijective() {
        let mut map = IdMap::new();
        let vid = ObjectId::encode(0, ObjectType::Port, 1).unwrap();
        let rid = ObjectId(0xdead_beef);
        map.bind(vid, rid).unwrap();
        assert_eq!(map.rid(vid), Some(rid));
        assert_eq!(map.vid(rid), Some(vid));

        // Same pair again is fine, conflicting pair is not.
        map.bind(vid, rid).unwrap();
        assert!(map.bind(vid, ObjectId(1)).is_err());
        assert!(map.bind(ObjectId(2), rid).is_err());
    }

    #[test]
    fn test_id_map_verify_inverse() {
        let vid = ObjectId::encode(0, ObjectType::Port, 1).unwrap();
        let rid = ObjectId(0x55);
        let map = IdMap::from_pairs([(vid, rid)]).unwrap();

        map.verify_inverse([(rid, vid)]).unwrap();
        assert!(map.verify_inverse([]).is_err());
        assert!(map.verify_inverse([(ObjectId(9), vid)]).is_err());
    }

    #[test]
    fn test_object_id_serialization_roundtrip() {
        let vid = ObjectId::encode(2, ObjectType::Queue, 7).unwrap();
        let bytes = rmp_serde::to_vec(&vid).unwrap();
        let restored: ObjectId = rmp_serde::from_slice(&bytes).unwrap();
        assert_eq!(vid, restored);
    }
}
