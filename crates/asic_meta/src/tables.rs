//! Built-in attribute tables.
//!
//! One table per object type. Attribute ids are the table position and are
//! stable; append only.

use asic_model::{AttrValue, ObjectType, ValueKind};

use crate::{AttrId, AttrMeta, DefaultPolicy, Mutability, Registry};

const PACKET_ACTION: &[&str] = &[
    "SAI_PACKET_ACTION_DROP",
    "SAI_PACKET_ACTION_FORWARD",
    "SAI_PACKET_ACTION_COPY",
    "SAI_PACKET_ACTION_COPY_CANCEL",
    "SAI_PACKET_ACTION_TRAP",
    "SAI_PACKET_ACTION_LOG",
    "SAI_PACKET_ACTION_DENY",
    "SAI_PACKET_ACTION_TRANSIT",
];

const PORT_TYPE: &[&str] = &["SAI_PORT_TYPE_LOGICAL", "SAI_PORT_TYPE_CPU"];

const PORT_OPER_STATUS: &[&str] = &[
    "SAI_PORT_OPER_STATUS_UNKNOWN",
    "SAI_PORT_OPER_STATUS_UP",
    "SAI_PORT_OPER_STATUS_DOWN",
];

const ROUTER_INTERFACE_TYPE: &[&str] = &[
    "SAI_ROUTER_INTERFACE_TYPE_PORT",
    "SAI_ROUTER_INTERFACE_TYPE_VLAN",
    "SAI_ROUTER_INTERFACE_TYPE_LOOPBACK",
];

const NEXT_HOP_TYPE: &[&str] = &["SAI_NEXT_HOP_TYPE_IP"];

const NEXT_HOP_GROUP_TYPE: &[&str] = &["SAI_NEXT_HOP_GROUP_TYPE_ECMP"];

const HOSTIF_TYPE: &[&str] = &["SAI_HOSTIF_TYPE_NETDEV", "SAI_HOSTIF_TYPE_FD"];

const TRAP_TYPE: &[&str] = &[
    "SAI_HOSTIF_TRAP_TYPE_STP",
    "SAI_HOSTIF_TRAP_TYPE_LACP",
    "SAI_HOSTIF_TRAP_TYPE_LLDP",
    "SAI_HOSTIF_TRAP_TYPE_ARP_REQUEST",
    "SAI_HOSTIF_TRAP_TYPE_ARP_RESPONSE",
    "SAI_HOSTIF_TRAP_TYPE_DHCP",
    "SAI_HOSTIF_TRAP_TYPE_OSPF",
    "SAI_HOSTIF_TRAP_TYPE_IP2ME",
    "SAI_HOSTIF_TRAP_TYPE_TTL_ERROR",
];

const METER_TYPE: &[&str] = &["SAI_METER_TYPE_PACKETS", "SAI_METER_TYPE_BYTES"];

const POLICER_MODE: &[&str] = &[
    "SAI_POLICER_MODE_SR_TCM",
    "SAI_POLICER_MODE_TR_TCM",
    "SAI_POLICER_MODE_STORM_CONTROL",
];

const QUEUE_TYPE: &[&str] = &[
    "SAI_QUEUE_TYPE_ALL",
    "SAI_QUEUE_TYPE_UNICAST",
    "SAI_QUEUE_TYPE_MULTICAST",
];

const SCHEDULING_TYPE: &[&str] = &[
    "SAI_SCHEDULING_TYPE_STRICT",
    "SAI_SCHEDULING_TYPE_WRR",
    "SAI_SCHEDULING_TYPE_DWRR",
];

const ECN_MARK_MODE: &[&str] = &[
    "SAI_ECN_MARK_MODE_NONE",
    "SAI_ECN_MARK_MODE_GREEN",
    "SAI_ECN_MARK_MODE_YELLOW",
    "SAI_ECN_MARK_MODE_RED",
    "SAI_ECN_MARK_MODE_ALL",
];

const BUFFER_POOL_TYPE: &[&str] = &[
    "SAI_BUFFER_POOL_TYPE_INGRESS",
    "SAI_BUFFER_POOL_TYPE_EGRESS",
];

const BUFFER_POOL_THRESHOLD_MODE: &[&str] = &[
    "SAI_BUFFER_POOL_THRESHOLD_MODE_STATIC",
    "SAI_BUFFER_POOL_THRESHOLD_MODE_DYNAMIC",
];

const QOS_MAP_TYPE: &[&str] = &[
    "SAI_QOS_MAP_TYPE_DOT1P_TO_TC",
    "SAI_QOS_MAP_TYPE_DSCP_TO_TC",
    "SAI_QOS_MAP_TYPE_TC_TO_QUEUE",
];

const ACL_STAGE: &[&str] = &["SAI_ACL_STAGE_INGRESS", "SAI_ACL_STAGE_EGRESS"];

const FDB_ENTRY_TYPE: &[&str] = &["SAI_FDB_ENTRY_TYPE_DYNAMIC", "SAI_FDB_ENTRY_TYPE_STATIC"];

const NAT_TYPE: &[&str] = &[
    "SAI_NAT_TYPE_NONE",
    "SAI_NAT_TYPE_SOURCE_NAT",
    "SAI_NAT_TYPE_DESTINATION_NAT",
];

const VLAN_TAGGING_MODE: &[&str] = &[
    "SAI_VLAN_TAGGING_MODE_UNTAGGED",
    "SAI_VLAN_TAGGING_MODE_TAGGED",
    "SAI_VLAN_TAGGING_MODE_PRIORITY_TAGGED",
];

fn attr(id: u32, name: &'static str, kind: ValueKind) -> AttrMeta {
    AttrMeta {
        id: AttrId(id),
        name,
        kind,
        mutability: Mutability::CreateAndSet,
        is_key: false,
        mandatory_on_create: false,
        default: DefaultPolicy::None,
        allowed_types: Vec::new(),
        enum_names: None,
    }
}

impl AttrMeta {
    fn read_only(mut self) -> Self {
        self.mutability = Mutability::ReadOnly;
        self
    }

    fn create_only(mut self) -> Self {
        self.mutability = Mutability::CreateOnly;
        self
    }

    fn key(mut self) -> Self {
        self.is_key = true;
        self.mutability = Mutability::CreateOnly;
        self
    }

    fn mandatory(mut self) -> Self {
        self.mandatory_on_create = true;
        self
    }

    fn default_value(mut self, v: AttrValue) -> Self {
        self.default = DefaultPolicy::Value(v);
        self
    }

    fn default_empty_list(mut self) -> Self {
        self.default = DefaultPolicy::EmptyList;
        self
    }

    fn default_null_oid(mut self) -> Self {
        self.default = DefaultPolicy::NullOid;
        self
    }

    fn default_internal(mut self) -> Self {
        self.default = DefaultPolicy::SwitchInternal;
        self
    }

    fn refs(mut self, types: &[ObjectType]) -> Self {
        self.allowed_types = types.to_vec();
        self
    }

    fn enums(mut self, names: &'static [&'static str]) -> Self {
        self.enum_names = Some(names);
        self
    }
}

fn switch_table() -> Vec<AttrMeta> {
    vec![
        attr(0, "SAI_SWITCH_ATTR_INIT_SWITCH", ValueKind::Bool)
            .create_only()
            .mandatory(),
        attr(1, "SAI_SWITCH_ATTR_SRC_MAC_ADDRESS", ValueKind::Mac).default_internal(),
        attr(2, "SAI_SWITCH_ATTR_PORT_NUMBER", ValueKind::U32).read_only(),
        attr(3, "SAI_SWITCH_ATTR_PORT_LIST", ValueKind::OidList)
            .read_only()
            .refs(&[ObjectType::Port]),
        attr(4, "SAI_SWITCH_ATTR_CPU_PORT", ValueKind::Oid)
            .read_only()
            .refs(&[ObjectType::Port]),
        attr(5, "SAI_SWITCH_ATTR_DEFAULT_VIRTUAL_ROUTER_ID", ValueKind::Oid)
            .read_only()
            .refs(&[ObjectType::VirtualRouter]),
        attr(6, "SAI_SWITCH_ATTR_DEFAULT_TRAP_GROUP", ValueKind::Oid)
            .read_only()
            .refs(&[ObjectType::TrapGroup]),
        attr(7, "SAI_SWITCH_ATTR_DEFAULT_STP_INST_ID", ValueKind::Oid)
            .read_only()
            .refs(&[ObjectType::Stp]),
        attr(8, "SAI_SWITCH_ATTR_DEFAULT_VLAN_ID", ValueKind::Oid)
            .read_only()
            .refs(&[ObjectType::Vlan]),
        attr(9, "SAI_SWITCH_ATTR_SWITCH_STATE_CHANGE_NOTIFY", ValueKind::Pointer),
        attr(10, "SAI_SWITCH_ATTR_FDB_EVENT_NOTIFY", ValueKind::Pointer),
        attr(11, "SAI_SWITCH_ATTR_PORT_STATE_CHANGE_NOTIFY", ValueKind::Pointer),
    ]
}

fn port_table() -> Vec<AttrMeta> {
    vec![
        attr(0, "SAI_PORT_ATTR_TYPE", ValueKind::I32)
            .read_only()
            .enums(PORT_TYPE),
        attr(1, "SAI_PORT_ATTR_HW_LANE_LIST", ValueKind::U32List)
            .key()
            .mandatory(),
        attr(2, "SAI_PORT_ATTR_SPEED", ValueKind::U32).mandatory(),
        attr(3, "SAI_PORT_ATTR_ADMIN_STATE", ValueKind::Bool)
            .default_value(AttrValue::Bool(false)),
        attr(4, "SAI_PORT_ATTR_MTU", ValueKind::U32).default_value(AttrValue::U32(1514)),
        attr(5, "SAI_PORT_ATTR_PORT_VLAN_ID", ValueKind::U16)
            .default_value(AttrValue::U16(1)),
        attr(6, "SAI_PORT_ATTR_OPER_STATUS", ValueKind::I32)
            .read_only()
            .enums(PORT_OPER_STATUS),
        attr(7, "SAI_PORT_ATTR_QOS_NUMBER_OF_QUEUES", ValueKind::U32).read_only(),
        attr(8, "SAI_PORT_ATTR_QOS_QUEUE_LIST", ValueKind::OidList)
            .read_only()
            .refs(&[ObjectType::Queue]),
        attr(
            9,
            "SAI_PORT_ATTR_NUMBER_OF_INGRESS_PRIORITY_GROUPS",
            ValueKind::U32,
        )
        .read_only(),
        attr(10, "SAI_PORT_ATTR_INGRESS_PRIORITY_GROUP_LIST", ValueKind::OidList)
            .read_only()
            .refs(&[ObjectType::PriorityGroup]),
        attr(11, "SAI_PORT_ATTR_QOS_SCHEDULER_GROUP_LIST", ValueKind::OidList)
            .read_only()
            .refs(&[ObjectType::SchedulerGroup]),
        attr(12, "SAI_PORT_ATTR_QOS_DEFAULT_TC", ValueKind::U8)
            .default_value(AttrValue::U8(0)),
    ]
}

fn vlan_table() -> Vec<AttrMeta> {
    vec![
        attr(0, "SAI_VLAN_ATTR_VLAN_ID", ValueKind::U16).key().mandatory(),
        attr(1, "SAI_VLAN_ATTR_MEMBER_LIST", ValueKind::OidList)
            .read_only()
            .refs(&[ObjectType::VlanMember]),
        attr(2, "SAI_VLAN_ATTR_STP_INSTANCE", ValueKind::Oid)
            .refs(&[ObjectType::Stp])
            .default_internal(),
    ]
}

fn vlan_member_table() -> Vec<AttrMeta> {
    vec![
        attr(0, "SAI_VLAN_MEMBER_ATTR_VLAN_ID", ValueKind::Oid)
            .create_only()
            .mandatory()
            .refs(&[ObjectType::Vlan]),
        attr(1, "SAI_VLAN_MEMBER_ATTR_PORT_ID", ValueKind::Oid)
            .create_only()
            .mandatory()
            .refs(&[ObjectType::Port]),
        attr(2, "SAI_VLAN_MEMBER_ATTR_VLAN_TAGGING_MODE", ValueKind::I32)
            .enums(VLAN_TAGGING_MODE)
            .default_value(AttrValue::I32(0)),
    ]
}

fn virtual_router_table() -> Vec<AttrMeta> {
    vec![
        attr(0, "SAI_VIRTUAL_ROUTER_ATTR_ADMIN_V4_STATE", ValueKind::Bool)
            .default_value(AttrValue::Bool(true)),
        attr(1, "SAI_VIRTUAL_ROUTER_ATTR_ADMIN_V6_STATE", ValueKind::Bool)
            .default_value(AttrValue::Bool(true)),
        attr(2, "SAI_VIRTUAL_ROUTER_ATTR_SRC_MAC_ADDRESS", ValueKind::Mac).default_internal(),
        attr(
            3,
            "SAI_VIRTUAL_ROUTER_ATTR_VIOLATION_TTL1_PACKET_ACTION",
            ValueKind::I32,
        )
        .enums(PACKET_ACTION)
        .default_value(AttrValue::I32(4)),
    ]
}

fn router_interface_table() -> Vec<AttrMeta> {
    vec![
        attr(0, "SAI_ROUTER_INTERFACE_ATTR_VIRTUAL_ROUTER_ID", ValueKind::Oid)
            .create_only()
            .mandatory()
            .refs(&[ObjectType::VirtualRouter]),
        attr(1, "SAI_ROUTER_INTERFACE_ATTR_TYPE", ValueKind::I32)
            .create_only()
            .mandatory()
            .enums(ROUTER_INTERFACE_TYPE),
        attr(2, "SAI_ROUTER_INTERFACE_ATTR_PORT_ID", ValueKind::Oid)
            .create_only()
            .refs(&[ObjectType::Port]),
        attr(3, "SAI_ROUTER_INTERFACE_ATTR_VLAN_ID", ValueKind::Oid)
            .create_only()
            .refs(&[ObjectType::Vlan]),
        attr(4, "SAI_ROUTER_INTERFACE_ATTR_SRC_MAC_ADDRESS", ValueKind::Mac)
            .default_internal(),
        attr(5, "SAI_ROUTER_INTERFACE_ATTR_MTU", ValueKind::U32)
            .default_value(AttrValue::U32(1514)),
    ]
}

fn next_hop_table() -> Vec<AttrMeta> {
    vec![
        attr(0, "SAI_NEXT_HOP_ATTR_TYPE", ValueKind::I32)
            .create_only()
            .mandatory()
            .enums(NEXT_HOP_TYPE),
        attr(1, "SAI_NEXT_HOP_ATTR_IP", ValueKind::IpAddress)
            .create_only()
            .mandatory(),
        attr(2, "SAI_NEXT_HOP_ATTR_ROUTER_INTERFACE_ID", ValueKind::Oid)
            .create_only()
            .mandatory()
            .refs(&[ObjectType::RouterInterface]),
    ]
}

fn next_hop_group_table() -> Vec<AttrMeta> {
    vec![
        attr(0, "SAI_NEXT_HOP_GROUP_ATTR_TYPE", ValueKind::I32)
            .create_only()
            .mandatory()
            .enums(NEXT_HOP_GROUP_TYPE),
        attr(1, "SAI_NEXT_HOP_GROUP_ATTR_NEXT_HOP_LIST", ValueKind::OidList)
            .mandatory()
            .refs(&[ObjectType::NextHop]),
        attr(2, "SAI_NEXT_HOP_GROUP_ATTR_NEXT_HOP_COUNT", ValueKind::U32).read_only(),
    ]
}

fn hostif_table() -> Vec<AttrMeta> {
    vec![
        attr(0, "SAI_HOSTIF_ATTR_TYPE", ValueKind::I32)
            .create_only()
            .mandatory()
            .enums(HOSTIF_TYPE),
        attr(1, "SAI_HOSTIF_ATTR_OBJ_ID", ValueKind::Oid)
            .create_only()
            .refs(&[ObjectType::Port, ObjectType::Vlan, ObjectType::RouterInterface]),
        attr(2, "SAI_HOSTIF_ATTR_NAME", ValueKind::CharData)
            .create_only()
            .mandatory(),
        attr(3, "SAI_HOSTIF_ATTR_OPER_STATUS", ValueKind::Bool)
            .default_value(AttrValue::Bool(false)),
    ]
}

fn trap_table() -> Vec<AttrMeta> {
    vec![
        attr(0, "SAI_HOSTIF_TRAP_ATTR_TRAP_TYPE", ValueKind::I32)
            .key()
            .mandatory()
            .enums(TRAP_TYPE),
        attr(1, "SAI_HOSTIF_TRAP_ATTR_PACKET_ACTION", ValueKind::I32)
            .mandatory()
            .enums(PACKET_ACTION),
        attr(2, "SAI_HOSTIF_TRAP_ATTR_TRAP_PRIORITY", ValueKind::U32)
            .default_value(AttrValue::U32(0)),
        attr(3, "SAI_HOSTIF_TRAP_ATTR_TRAP_GROUP", ValueKind::Oid)
            .refs(&[ObjectType::TrapGroup])
            .default_internal(),
    ]
}

fn trap_group_table() -> Vec<AttrMeta> {
    vec![
        attr(0, "SAI_HOSTIF_TRAP_GROUP_ATTR_ADMIN_STATE", ValueKind::Bool)
            .default_value(AttrValue::Bool(true)),
        attr(1, "SAI_HOSTIF_TRAP_GROUP_ATTR_QUEUE", ValueKind::U32)
            .default_value(AttrValue::U32(0)),
        attr(2, "SAI_HOSTIF_TRAP_GROUP_ATTR_POLICER", ValueKind::Oid)
            .refs(&[ObjectType::Policer])
            .default_null_oid(),
    ]
}

fn policer_table() -> Vec<AttrMeta> {
    vec![
        attr(0, "SAI_POLICER_ATTR_METER_TYPE", ValueKind::I32)
            .create_only()
            .mandatory()
            .enums(METER_TYPE),
        attr(1, "SAI_POLICER_ATTR_MODE", ValueKind::I32)
            .create_only()
            .mandatory()
            .enums(POLICER_MODE),
        attr(2, "SAI_POLICER_ATTR_CBS", ValueKind::U64).default_value(AttrValue::U64(0)),
        attr(3, "SAI_POLICER_ATTR_CIR", ValueKind::U64).default_value(AttrValue::U64(0)),
    ]
}

fn queue_table() -> Vec<AttrMeta> {
    vec![
        attr(0, "SAI_QUEUE_ATTR_TYPE", ValueKind::I32)
            .key()
            .mandatory()
            .enums(QUEUE_TYPE),
        attr(1, "SAI_QUEUE_ATTR_INDEX", ValueKind::U8).key().mandatory(),
        attr(2, "SAI_QUEUE_ATTR_WRED_PROFILE_ID", ValueKind::Oid)
            .refs(&[ObjectType::Wred])
            .default_null_oid(),
        attr(3, "SAI_QUEUE_ATTR_BUFFER_PROFILE_ID", ValueKind::Oid)
            .refs(&[ObjectType::BufferProfile])
            .default_null_oid(),
        attr(4, "SAI_QUEUE_ATTR_SCHEDULER_PROFILE_ID", ValueKind::Oid)
            .refs(&[ObjectType::Scheduler])
            .default_null_oid(),
    ]
}

fn priority_group_table() -> Vec<AttrMeta> {
    vec![
        attr(0, "SAI_INGRESS_PRIORITY_GROUP_ATTR_INDEX", ValueKind::U8)
            .key()
            .mandatory(),
        attr(1, "SAI_INGRESS_PRIORITY_GROUP_ATTR_PORT", ValueKind::Oid)
            .read_only()
            .refs(&[ObjectType::Port]),
        attr(2, "SAI_INGRESS_PRIORITY_GROUP_ATTR_BUFFER_PROFILE", ValueKind::Oid)
            .refs(&[ObjectType::BufferProfile])
            .default_null_oid(),
    ]
}

fn scheduler_table() -> Vec<AttrMeta> {
    vec![
        attr(0, "SAI_SCHEDULER_ATTR_SCHEDULING_TYPE", ValueKind::I32)
            .enums(SCHEDULING_TYPE)
            .default_value(AttrValue::I32(1)),
        attr(1, "SAI_SCHEDULER_ATTR_SCHEDULING_WEIGHT", ValueKind::U8)
            .default_value(AttrValue::U8(1)),
        attr(2, "SAI_SCHEDULER_ATTR_MAX_BANDWIDTH_RATE", ValueKind::U64)
            .default_value(AttrValue::U64(0)),
    ]
}

fn scheduler_group_table() -> Vec<AttrMeta> {
    vec![
        attr(0, "SAI_SCHEDULER_GROUP_ATTR_PORT_ID", ValueKind::Oid)
            .create_only()
            .mandatory()
            .refs(&[ObjectType::Port]),
        attr(1, "SAI_SCHEDULER_GROUP_ATTR_LEVEL", ValueKind::U8)
            .create_only()
            .mandatory(),
        attr(2, "SAI_SCHEDULER_GROUP_ATTR_CHILD_COUNT", ValueKind::U32).read_only(),
        attr(3, "SAI_SCHEDULER_GROUP_ATTR_CHILD_LIST", ValueKind::OidList)
            .read_only()
            .refs(&[ObjectType::SchedulerGroup, ObjectType::Queue]),
        attr(4, "SAI_SCHEDULER_GROUP_ATTR_SCHEDULER_PROFILE_ID", ValueKind::Oid)
            .refs(&[ObjectType::Scheduler])
            .default_null_oid(),
    ]
}

fn wred_table() -> Vec<AttrMeta> {
    vec![
        attr(0, "SAI_WRED_ATTR_GREEN_ENABLE", ValueKind::Bool)
            .default_value(AttrValue::Bool(false)),
        attr(1, "SAI_WRED_ATTR_GREEN_MIN_THRESHOLD", ValueKind::U32)
            .default_value(AttrValue::U32(0)),
        attr(2, "SAI_WRED_ATTR_GREEN_MAX_THRESHOLD", ValueKind::U32)
            .default_value(AttrValue::U32(0)),
        attr(3, "SAI_WRED_ATTR_ECN_MARK_MODE", ValueKind::I32)
            .enums(ECN_MARK_MODE)
            .default_value(AttrValue::I32(0)),
    ]
}

fn buffer_pool_table() -> Vec<AttrMeta> {
    vec![
        attr(0, "SAI_BUFFER_POOL_ATTR_TYPE", ValueKind::I32)
            .create_only()
            .mandatory()
            .enums(BUFFER_POOL_TYPE),
        attr(1, "SAI_BUFFER_POOL_ATTR_SIZE", ValueKind::U64).mandatory(),
        attr(2, "SAI_BUFFER_POOL_ATTR_THRESHOLD_MODE", ValueKind::I32)
            .create_only()
            .enums(BUFFER_POOL_THRESHOLD_MODE)
            .default_value(AttrValue::I32(1)),
        attr(3, "SAI_BUFFER_POOL_ATTR_SHARED_SIZE", ValueKind::U64).read_only(),
    ]
}

fn buffer_profile_table() -> Vec<AttrMeta> {
    vec![
        attr(0, "SAI_BUFFER_PROFILE_ATTR_POOL_ID", ValueKind::Oid)
            .create_only()
            .mandatory()
            .refs(&[ObjectType::BufferPool]),
        attr(1, "SAI_BUFFER_PROFILE_ATTR_BUFFER_SIZE", ValueKind::U64).mandatory(),
        attr(2, "SAI_BUFFER_PROFILE_ATTR_SHARED_DYNAMIC_TH", ValueKind::I8)
            .default_value(AttrValue::I8(0)),
        attr(3, "SAI_BUFFER_PROFILE_ATTR_XOFF_TH", ValueKind::U64)
            .default_value(AttrValue::U64(0)),
        attr(4, "SAI_BUFFER_PROFILE_ATTR_XON_TH", ValueKind::U64)
            .default_value(AttrValue::U64(0)),
    ]
}

fn qos_map_table() -> Vec<AttrMeta> {
    vec![
        attr(0, "SAI_QOS_MAP_ATTR_TYPE", ValueKind::I32)
            .create_only()
            .mandatory()
            .enums(QOS_MAP_TYPE),
        attr(1, "SAI_QOS_MAP_ATTR_MAP_TO_VALUE_LIST", ValueKind::QosMapList)
            .default_empty_list(),
    ]
}

fn acl_table_table() -> Vec<AttrMeta> {
    vec![
        attr(0, "SAI_ACL_TABLE_ATTR_STAGE", ValueKind::I32)
            .create_only()
            .mandatory()
            .enums(ACL_STAGE),
        attr(1, "SAI_ACL_TABLE_ATTR_PRIORITY", ValueKind::U32)
            .create_only()
            .default_value(AttrValue::U32(0)),
        attr(2, "SAI_ACL_TABLE_ATTR_SIZE", ValueKind::U32)
            .create_only()
            .default_value(AttrValue::U32(0)),
    ]
}

fn acl_entry_table() -> Vec<AttrMeta> {
    vec![
        attr(0, "SAI_ACL_ENTRY_ATTR_TABLE_ID", ValueKind::Oid)
            .create_only()
            .mandatory()
            .refs(&[ObjectType::AclTable]),
        attr(1, "SAI_ACL_ENTRY_ATTR_PRIORITY", ValueKind::U32)
            .default_value(AttrValue::U32(0)),
        attr(2, "SAI_ACL_ENTRY_ATTR_ADMIN_STATE", ValueKind::Bool)
            .default_value(AttrValue::Bool(true)),
        attr(3, "SAI_ACL_ENTRY_ATTR_FIELD_SRC_IP", ValueKind::AclFieldIp4),
        attr(4, "SAI_ACL_ENTRY_ATTR_FIELD_ETHER_TYPE", ValueKind::AclFieldU16),
        attr(5, "SAI_ACL_ENTRY_ATTR_FIELD_IN_PORT", ValueKind::AclFieldOid)
            .refs(&[ObjectType::Port]),
        attr(6, "SAI_ACL_ENTRY_ATTR_ACTION_REDIRECT", ValueKind::AclActionOid)
            .refs(&[ObjectType::Port, ObjectType::NextHop, ObjectType::NextHopGroup]),
        attr(7, "SAI_ACL_ENTRY_ATTR_ACTION_SET_POLICER", ValueKind::AclActionOid)
            .refs(&[ObjectType::Policer]),
        attr(8, "SAI_ACL_ENTRY_ATTR_ACTION_PACKET_ACTION", ValueKind::AclActionU32),
    ]
}

fn stp_table() -> Vec<AttrMeta> {
    vec![attr(0, "SAI_STP_ATTR_VLAN_LIST", ValueKind::VlanList).read_only()]
}

fn fdb_entry_table() -> Vec<AttrMeta> {
    vec![
        attr(0, "SAI_FDB_ENTRY_ATTR_TYPE", ValueKind::I32)
            .mandatory()
            .enums(FDB_ENTRY_TYPE),
        attr(1, "SAI_FDB_ENTRY_ATTR_PORT_ID", ValueKind::Oid)
            .mandatory()
            .refs(&[ObjectType::Port]),
        attr(2, "SAI_FDB_ENTRY_ATTR_PACKET_ACTION", ValueKind::I32)
            .enums(PACKET_ACTION)
            .default_value(AttrValue::I32(1)),
    ]
}

fn neighbor_entry_table() -> Vec<AttrMeta> {
    vec![
        attr(0, "SAI_NEIGHBOR_ENTRY_ATTR_DST_MAC_ADDRESS", ValueKind::Mac).mandatory(),
        attr(1, "SAI_NEIGHBOR_ENTRY_ATTR_NO_HOST_ROUTE", ValueKind::Bool)
            .default_value(AttrValue::Bool(false)),
    ]
}

fn route_entry_table() -> Vec<AttrMeta> {
    vec![
        attr(0, "SAI_ROUTE_ENTRY_ATTR_PACKET_ACTION", ValueKind::I32)
            .enums(PACKET_ACTION)
            .default_value(AttrValue::I32(1)),
        attr(1, "SAI_ROUTE_ENTRY_ATTR_NEXT_HOP_ID", ValueKind::Oid)
            .refs(&[ObjectType::NextHop, ObjectType::NextHopGroup, ObjectType::Port])
            .default_null_oid(),
    ]
}

fn inseg_entry_table() -> Vec<AttrMeta> {
    vec![
        attr(0, "SAI_INSEG_ENTRY_ATTR_NUM_OF_POP", ValueKind::U8)
            .default_value(AttrValue::U8(1)),
        attr(1, "SAI_INSEG_ENTRY_ATTR_NEXT_HOP_ID", ValueKind::Oid)
            .refs(&[ObjectType::NextHop])
            .default_null_oid(),
        attr(2, "SAI_INSEG_ENTRY_ATTR_PACKET_ACTION", ValueKind::I32)
            .enums(PACKET_ACTION)
            .default_value(AttrValue::I32(1)),
    ]
}

fn l2mc_entry_table() -> Vec<AttrMeta> {
    vec![
        attr(0, "SAI_L2MC_ENTRY_ATTR_PACKET_ACTION", ValueKind::I32)
            .enums(PACKET_ACTION)
            .default_value(AttrValue::I32(1)),
    ]
}

fn ipmc_entry_table() -> Vec<AttrMeta> {
    vec![
        attr(0, "SAI_IPMC_ENTRY_ATTR_PACKET_ACTION", ValueKind::I32)
            .enums(PACKET_ACTION)
            .default_value(AttrValue::I32(1)),
    ]
}

fn mcast_fdb_entry_table() -> Vec<AttrMeta> {
    vec![
        attr(0, "SAI_MCAST_FDB_ENTRY_ATTR_PACKET_ACTION", ValueKind::I32)
            .enums(PACKET_ACTION)
            .default_value(AttrValue::I32(1)),
    ]
}

fn nat_entry_table() -> Vec<AttrMeta> {
    vec![
        attr(0, "SAI_NAT_ENTRY_ATTR_NAT_TYPE", ValueKind::I32)
            .enums(NAT_TYPE)
            .default_value(AttrValue::I32(0)),
        attr(1, "SAI_NAT_ENTRY_ATTR_SRC_IP", ValueKind::Ip4)
            .default_value(AttrValue::Ip4(std::net::Ipv4Addr::UNSPECIFIED)),
    ]
}

/// Build the built-in registry.
pub(crate) fn builtin() -> Registry {
    Registry::from_tables(vec![
        (ObjectType::Switch, switch_table()),
        (ObjectType::Port, port_table()),
        (ObjectType::Vlan, vlan_table()),
        (ObjectType::VlanMember, vlan_member_table()),
        (ObjectType::VirtualRouter, virtual_router_table()),
        (ObjectType::RouterInterface, router_interface_table()),
        (ObjectType::NextHop, next_hop_table()),
        (ObjectType::NextHopGroup, next_hop_group_table()),
        (ObjectType::HostIf, hostif_table()),
        (ObjectType::Trap, trap_table()),
        (ObjectType::TrapGroup, trap_group_table()),
        (ObjectType::Policer, policer_table()),
        (ObjectType::Queue, queue_table()),
        (ObjectType::PriorityGroup, priority_group_table()),
        (ObjectType::Scheduler, scheduler_table()),
        (ObjectType::SchedulerGroup, scheduler_group_table()),
        (ObjectType::Wred, wred_table()),
        (ObjectType::BufferPool, buffer_pool_table()),
        (ObjectType::BufferProfile, buffer_profile_table()),
        (ObjectType::QosMap, qos_map_table()),
        (ObjectType::AclTable, acl_table_table()),
        (ObjectType::AclEntry, acl_entry_table()),
        (ObjectType::Stp, stp_table()),
        (ObjectType::FdbEntry, fdb_entry_table()),
        (ObjectType::NeighborEntry, neighbor_entry_table()),
        (ObjectType::RouteEntry, route_entry_table()),
        (ObjectType::InsegEntry, inseg_entry_table()),
        (ObjectType::L2mcEntry, l2mc_entry_table()),
        (ObjectType::IpmcEntry, ipmc_entry_table()),
        (ObjectType::McastFdbEntry, mcast_fdb_entry_table()),
        (ObjectType::NatEntry, nat_entry_table()),
    ])
}
