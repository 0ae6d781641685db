//! The closed set of ASIC object types.
//!
//! Every object in a view is tagged with one of these. The discriminant is
//! the byte embedded in virtual object ids, so values are explicit and must
//! never be reordered.

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// ASIC object type tag.
///
/// Types whose instances are identified by a structured key rather than an
/// object id (`*Entry` variants) answer `true` from [`ObjectType::is_entry`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[repr(u8)]
pub enum ObjectType {
    /// Sentinel, never a real object.
    Null = 0,
    Switch = 1,
    Port = 2,
    Vlan = 3,
    VlanMember = 4,
    VirtualRouter = 5,
    RouterInterface = 6,
    NextHop = 7,
    NextHopGroup = 8,
    HostIf = 9,
    Trap = 10,
    TrapGroup = 11,
    Policer = 12,
    Queue = 13,
    PriorityGroup = 14,
    Scheduler = 15,
    SchedulerGroup = 16,
    Wred = 17,
    BufferPool = 18,
    BufferProfile = 19,
    QosMap = 20,
    AclTable = 21,
    AclEntry = 22,
    Stp = 23,
    FdbEntry = 24,
    NeighborEntry = 25,
    RouteEntry = 26,
    InsegEntry = 27,
    L2mcEntry = 28,
    IpmcEntry = 29,
    McastFdbEntry = 30,
    NatEntry = 31,
}

impl ObjectType {
    /// Every real object type, entries included. `Null` is excluded.
    pub const ALL: [ObjectType; 31] = [
        ObjectType::Switch,
        ObjectType::Port,
        ObjectType::Vlan,
        ObjectType::VlanMember,
        ObjectType::VirtualRouter,
        ObjectType::RouterInterface,
        ObjectType::NextHop,
        ObjectType::NextHopGroup,
        ObjectType::HostIf,
        ObjectType::Trap,
        ObjectType::TrapGroup,
        ObjectType::Policer,
        ObjectType::Queue,
        ObjectType::PriorityGroup,
        ObjectType::Scheduler,
        ObjectType::SchedulerGroup,
        ObjectType::Wred,
        ObjectType::BufferPool,
        ObjectType::BufferProfile,
        ObjectType::QosMap,
        ObjectType::AclTable,
        ObjectType::AclEntry,
        ObjectType::Stp,
        ObjectType::FdbEntry,
        ObjectType::NeighborEntry,
        ObjectType::RouteEntry,
        ObjectType::InsegEntry,
        ObjectType::L2mcEntry,
        ObjectType::IpmcEntry,
        ObjectType::McastFdbEntry,
        ObjectType::NatEntry,
    ];

    /// The canonical upper-case name, e.g. `SAI_OBJECT_TYPE_ROUTE_ENTRY`.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            ObjectType::Null => "SAI_OBJECT_TYPE_NULL",
            ObjectType::Switch => "SAI_OBJECT_TYPE_SWITCH",
            ObjectType::Port => "SAI_OBJECT_TYPE_PORT",
            ObjectType::Vlan => "SAI_OBJECT_TYPE_VLAN",
            ObjectType::VlanMember => "SAI_OBJECT_TYPE_VLAN_MEMBER",
            ObjectType::VirtualRouter => "SAI_OBJECT_TYPE_VIRTUAL_ROUTER",
            ObjectType::RouterInterface => "SAI_OBJECT_TYPE_ROUTER_INTERFACE",
            ObjectType::NextHop => "SAI_OBJECT_TYPE_NEXT_HOP",
            ObjectType::NextHopGroup => "SAI_OBJECT_TYPE_NEXT_HOP_GROUP",
            ObjectType::HostIf => "SAI_OBJECT_TYPE_HOSTIF",
            ObjectType::Trap => "SAI_OBJECT_TYPE_HOSTIF_TRAP",
            ObjectType::TrapGroup => "SAI_OBJECT_TYPE_HOSTIF_TRAP_GROUP",
            ObjectType::Policer => "SAI_OBJECT_TYPE_POLICER",
            ObjectType::Queue => "SAI_OBJECT_TYPE_QUEUE",
            ObjectType::PriorityGroup => "SAI_OBJECT_TYPE_INGRESS_PRIORITY_GROUP",
            ObjectType::Scheduler => "SAI_OBJECT_TYPE_SCHEDULER",
            ObjectType::SchedulerGroup => "SAI_OBJECT_TYPE_SCHEDULER_GROUP",
            ObjectType::Wred => "SAI_OBJECT_TYPE_WRED",
            ObjectType::BufferPool => "SAI_OBJECT_TYPE_BUFFER_POOL",
            ObjectType::BufferProfile => "SAI_OBJECT_TYPE_BUFFER_PROFILE",
            ObjectType::QosMap => "SAI_OBJECT_TYPE_QOS_MAP",
            ObjectType::AclTable => "SAI_OBJECT_TYPE_ACL_TABLE",
            ObjectType::AclEntry => "SAI_OBJECT_TYPE_ACL_ENTRY",
            ObjectType::Stp => "SAI_OBJECT_TYPE_STP",
            ObjectType::FdbEntry => "SAI_OBJECT_TYPE_FDB_ENTRY",
            ObjectType::NeighborEntry => "SAI_OBJECT_TYPE_NEIGHBOR_ENTRY",
            ObjectType::RouteEntry => "SAI_OBJECT_TYPE_ROUTE_ENTRY",
            ObjectType::InsegEntry => "SAI_OBJECT_TYPE_INSEG_ENTRY",
            ObjectType::L2mcEntry => "SAI_OBJECT_TYPE_L2MC_ENTRY",
            ObjectType::IpmcEntry => "SAI_OBJECT_TYPE_IPMC_ENTRY",
            ObjectType::McastFdbEntry => "SAI_OBJECT_TYPE_MCAST_FDB_ENTRY",
            ObjectType::NatEntry => "SAI_OBJECT_TYPE_NAT_ENTRY",
        }
    }

    /// Resolve a canonical name back to its type.
    pub fn from_name(name: &str) -> Result<ObjectType, ModelError> {
        ObjectType::ALL
            .iter()
            .copied()
            .find(|ot| ot.name() == name)
            .ok_or_else(|| ModelError::UnknownObjectType(name.to_string()))
    }

    /// Resolve the raw discriminant byte used inside object ids.
    pub fn from_raw(raw: u8) -> Result<ObjectType, ModelError> {
        if raw == 0 {
            return Ok(ObjectType::Null);
        }
        ObjectType::ALL
            .iter()
            .copied()
            .find(|ot| *ot as u8 == raw)
            .ok_or(ModelError::InvalidObjectTypeByte(raw))
    }

    /// Whether instances of this type are identified by a structured key.
    #[must_use]
    pub const fn is_entry(self) -> bool {
        matches!(
            self,
            ObjectType::FdbEntry
                | ObjectType::NeighborEntry
                | ObjectType::RouteEntry
                | ObjectType::InsegEntry
                | ObjectType::L2mcEntry
                | ObjectType::IpmcEntry
                | ObjectType::McastFdbEntry
                | ObjectType::NatEntry
        )
    }
}

impl std::fmt::Display for ObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_roundtrip() {
        for ot in ObjectType::ALL {
            assert_eq!(ObjectType::from_name(ot.name()).unwrap(), ot);
        }
    }

    #[test]
    fn test_raw_roundtrip() {
        for ot in ObjectType::ALL {
            assert_eq!(ObjectType::from_raw(ot as u8).unwrap(), ot);
        }
        assert_eq!(ObjectType::from_raw(0).unwrap(), ObjectType::Null);
    }

    #[test]
    fn test_invalid_raw_rejected() {
        assert!(ObjectType::from_raw(200).is_err());
    }

    #[test]
    fn test_entry_classification() {
        assert!(ObjectType::RouteEntry.is_entry());
        assert!(ObjectType::FdbEntry.is_entry());
        assert!(!ObjectType::Port.is_entry());
        assert!(!ObjectType::Switch.is_entry());
    }
}
