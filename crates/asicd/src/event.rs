//! The daemon's record event loop.
//!
//! Consumes the ordered stream of transported records: plain ASIC
//! operations replay immediately against the driver; during a view swap
//! (`INIT_VIEW` … `APPLY_VIEW`) incoming state accumulates in the
//! temporary tables and the reconciliation engine takes over on apply.

use std::collections::HashSet;
use std::sync::Arc;

use futures::StreamExt;
use tracing::{debug, error, info, warn};

use asic_apply::{apply_view_transition, ApplyConfig, ApplyError};
use asic_driver::{Attr, Driver, DriverError, STATUS_SUCCESS};
use asic_meta::{MetaError, Registry};
use asic_model::{EntryKey, IdMap, ModelError, ObjectId, ObjectType};
use asic_net::record::REQUEST_ID_FIELD;
use asic_net::{subjects, BulkErrorMode, BulkRecord, NatsConnection, NetError, Record, RecordOp};
use asic_view::ViewError;

use crate::apply::{self, ExecError};
use crate::config::DaemonConfig;
use crate::store::{self, StateStore, ASIC_STATE, TEMP_PREFIX};
use crate::switch::{SaiSwitch, SwitchError};

/// Errors raised while handling records.
#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    #[error(transparent)]
    Driver(#[from] DriverError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Meta(#[from] MetaError),

    #[error(transparent)]
    View(#[from] ViewError),

    #[error(transparent)]
    Apply(#[from] ApplyError),

    #[error(transparent)]
    Exec(#[from] ExecError),

    #[error(transparent)]
    Switch(#[from] SwitchError),

    #[error(transparent)]
    Reinit(#[from] crate::reinit::ReinitError),

    #[error(transparent)]
    Net(#[from] NetError),

    #[error("vid {0} has no rid binding")]
    MissingBinding(ObjectId),

    #[error("malformed record: {0}")]
    Malformed(String),
}

/// The consumer daemon for one switch.
pub struct Daemon {
    driver: Arc<dyn Driver>,
    store: Arc<dyn StateStore>,
    config: DaemonConfig,
    switch: SaiSwitch,
    /// Live VID ↔ RID map, mirrored into the store on every change.
    id_map: IdMap,
    /// Whether records are being collected into the temporary view.
    collecting_view: bool,
    /// Notifications produced while handling records, drained by the run
    /// loop after each record.
    pending_notifications: Vec<(String, Record)>,
}

impl Daemon {
    /// Bring the switch up: cold boot seeds state from discovery, a
    /// populated store triggers hard reinit instead.
    pub fn start(
        driver: Arc<dyn Driver>,
        store: Arc<dyn StateStore>,
        config: DaemonConfig,
    ) -> Result<Daemon, DaemonError> {
        let cold = store.keys(ASIC_STATE).is_empty();
        let mut switch = SaiSwitch::probe(driver.as_ref())?;

        let id_map = if cold {
            info!("no persisted state, cold boot");
            let mut allocator = asic_model::VidAllocator::new(config.switch_index);
            switch.seed_cold(driver.as_ref(), store.as_ref(), &mut allocator)?
        } else {
            info!("persisted state found, running hard reinit");
            switch.load_cold_vids(store.as_ref())?;
            crate::reinit::hard_reinit(driver.as_ref(), store.as_ref(), &switch)?
        };

        Ok(Daemon {
            driver,
            store,
            config,
            switch,
            id_map,
            collecting_view: false,
            pending_notifications: Vec::new(),
        })
    }

    /// The per-switch bookkeeping.
    #[must_use]
    pub fn switch(&self) -> &SaiSwitch {
        &self.switch
    }

    /// The live identifier map.
    #[must_use]
    pub fn id_map(&self) -> &IdMap {
        &self.id_map
    }

    /// Handle one record; an optional response record is returned for the
    /// response subject.
    pub fn handle_record(&mut self, record: &Record) -> Result<Option<Record>, DaemonError> {
        if record.is_view_command() {
            return self.handle_view_command(record);
        }
        match record.op {
            RecordOp::Create | RecordOp::Remove | RecordOp::Set => {
                if self.collecting_view {
                    self.collect_into_temp(record)?;
                    Ok(None)
                } else {
                    self.replay_single(record)?;
                    Ok(None)
                }
            }
            RecordOp::Get => self.handle_get(record).map(Some),
            RecordOp::BulkCreate | RecordOp::BulkRemove | RecordOp::BulkSet => {
                self.handle_bulk(record).map(Some)
            }
            RecordOp::Notify | RecordOp::GetResponse => {
                debug!(key = record.key, op = record.op.tag(), "ignoring record");
                Ok(None)
            }
        }
    }

    fn handle_view_command(&mut self, record: &Record) -> Result<Option<Record>, DaemonError> {
        if record.key == asic_net::record::INIT_VIEW {
            info!("INIT_VIEW: collecting temporary view");
            self.store.clear(&format!("{TEMP_PREFIX}{ASIC_STATE}"));
            self.collecting_view = true;
            return Ok(None);
        }
        info!("APPLY_VIEW: reconciling views");
        self.apply_view()?;
        self.collecting_view = false;
        Ok(None)
    }

    /// While a view swap is open, state-changing records only touch the
    /// temporary tables; nothing reaches the driver until apply.
    fn collect_into_temp(&mut self, record: &Record) -> Result<(), DaemonError> {
        let table = format!("{TEMP_PREFIX}{ASIC_STATE}");
        match record.op {
            RecordOp::Create => {
                let fields = if record.fields.is_empty() {
                    vec![("NULL".to_string(), "NULL".to_string())]
                } else {
                    record.fields.clone()
                };
                self.store.put(&table, &record.key, fields);
            }
            RecordOp::Set => {
                for (name, value) in &record.fields {
                    self.store.put_field(&table, &record.key, name, value);
                }
            }
            RecordOp::Remove => self.store.del(&table, &record.key),
            _ => {}
        }
        Ok(())
    }

    fn rid_of(&self, vid: ObjectId) -> Result<ObjectId, DaemonError> {
        self.id_map.rid(vid).ok_or(DaemonError::MissingBinding(vid))
    }

    fn build_attrs(
        &self,
        object_type: ObjectType,
        fields: &[(String, String)],
    ) -> Result<Vec<Attr>, DaemonError> {
        let registry = Registry::global();
        let mut attrs = Vec::new();
        for (name, canon) in fields {
            if name == "NULL" || name == REQUEST_ID_FIELD {
                continue;
            }
            let (owner, meta) = registry.by_name(name)?;
            if owner != object_type {
                return Err(DaemonError::Malformed(format!(
                    "attribute {name} does not belong to {object_type}"
                )));
            }
            let mut value = meta.deserialize_value(canon)?;
            value.map_oids(|vid| self.rid_of(vid))?;
            attrs.push(Attr::new(meta, value));
        }
        Ok(attrs)
    }

    fn bind_and_persist(
        &mut self,
        record: &Record,
        vid: ObjectId,
        rid: ObjectId,
    ) -> Result<(), DaemonError> {
        self.id_map.bind(vid, rid)?;
        self.store.put(
            ASIC_STATE,
            &record.key,
            if record.fields.is_empty() {
                vec![("NULL".to_string(), "NULL".to_string())]
            } else {
                record.fields.clone()
            },
        );
        store::save_id_map(self.store.as_ref(), "", &self.id_map);
        Ok(())
    }

    /// Replay one create/set/remove straight against the driver,
    /// mirroring the result into the persisted view.
    fn replay_single(&mut self, record: &Record) -> Result<(), DaemonError> {
        let (object_type, id) = record
            .parse_key()
            .map_err(|e| DaemonError::Malformed(e.to_string()))?;

        if object_type.is_entry() {
            let mut key = EntryKey::from_canon(object_type, id)?;
            let attrs = self.build_attrs(object_type, &record.fields)?;
            key.map_oids(|vid| self.rid_of(vid))?;
            match record.op {
                RecordOp::Create => {
                    self.driver.create_entry(&key, &attrs)?;
                    self.store
                        .put(ASIC_STATE, &record.key, record.fields.clone());
                }
                RecordOp::Set => {
                    for attr in &attrs {
                        self.driver.set_entry(&key, attr)?;
                    }
                    for (name, value) in &record.fields {
                        self.store.put_field(ASIC_STATE, &record.key, name, value);
                    }
                }
                RecordOp::Remove => {
                    self.driver.remove_entry(&key)?;
                    self.store.del(ASIC_STATE, &record.key);
                }
                _ => {}
            }
            return Ok(());
        }

        let vid: ObjectId = id
            .parse()
            .map_err(|e: ModelError| DaemonError::Malformed(e.to_string()))?;
        match record.op {
            RecordOp::Create => {
                let attrs = self.build_attrs(object_type, &record.fields)?;
                let rid = self.driver.create(object_type, &attrs)?;
                self.bind_and_persist(record, vid, rid)?;
            }
            RecordOp::Set => {
                let attrs = self.build_attrs(object_type, &record.fields)?;
                let rid = self.rid_of(vid)?;
                for attr in &attrs {
                    self.driver.set(rid, attr)?;
                    // The virtual profile reports a link transition when a
                    // port's admin state is toggled.
                    if attr.meta.name == "SAI_PORT_ATTR_ADMIN_STATE" {
                        let up = attr.value == asic_model::AttrValue::Bool(true);
                        self.pending_notifications.push((
                            subjects::NTF_PORT_STATE.to_string(),
                            Record {
                                key: "port_state".to_string(),
                                fields: vec![
                                    ("port".to_string(), vid.to_string()),
                                    (
                                        "status".to_string(),
                                        if up { "up" } else { "down" }.to_string(),
                                    ),
                                ],
                                op: RecordOp::Notify,
                            },
                        ));
                    }
                }
                for (name, value) in &record.fields {
                    self.store.put_field(ASIC_STATE, &record.key, name, value);
                }
            }
            RecordOp::Remove => {
                let rid = self.rid_of(vid)?;
                self.driver.remove(rid)?;
                self.id_map.unbind(vid);
                self.store.del(ASIC_STATE, &record.key);
                store::save_id_map(self.store.as_ref(), "", &self.id_map);
            }
            _ => {}
        }
        Ok(())
    }

    /// Answer a GET: fetch from the driver, translate RIDs back to VIDs
    /// and serialize through metadata.
    fn handle_get(&mut self, record: &Record) -> Result<Record, DaemonError> {
        let request_id = record
            .field(REQUEST_ID_FIELD)
            .unwrap_or_default()
            .to_string();
        let (object_type, id) = record
            .parse_key()
            .map_err(|e| DaemonError::Malformed(e.to_string()))?;
        let registry = Registry::global();

        let mut wanted = Vec::new();
        for (name, _) in &record.fields {
            if name == REQUEST_ID_FIELD {
                continue;
            }
            wanted.push(registry.by_name(name)?.1);
        }
        let ids: Vec<_> = wanted.iter().map(|m| m.id).collect();

        let fetched = if object_type.is_entry() {
            let mut key = EntryKey::from_canon(object_type, id)?;
            key.map_oids(|vid| self.rid_of(vid))?;
            self.driver.get_entry(&key, &ids)
        } else {
            let vid: ObjectId = id
                .parse()
                .map_err(|e: ModelError| DaemonError::Malformed(e.to_string()))?;
            let rid = self.rid_of(vid)?;
            self.driver.get(rid, &ids, crate::discovery::MAX_OID_LIST)
        };

        let response = match fetched {
            Ok(attrs) => {
                let mut values = Vec::with_capacity(attrs.len());
                for mut attr in attrs {
                    attr.value.map_oids(|rid| {
                        self.id_map
                            .vid(rid)
                            .ok_or(DaemonError::MissingBinding(rid))
                    })?;
                    values.push((
                        attr.meta.name.to_string(),
                        attr.meta.serialize_value(&attr.value),
                    ));
                }
                Record::get_response(&request_id, STATUS_SUCCESS, values)
            }
            Err(err) => {
                warn!(key = record.key, %err, "get failed");
                Record::get_response(&request_id, err.status_name(), Vec::new())
            }
        };
        Ok(response)
    }

    /// Expand a bulk record into per-element operations; semantics match
    /// issuing them one by one in element order.
    fn handle_bulk(&mut self, record: &Record) -> Result<Record, DaemonError> {
        let bulk =
            BulkRecord::from_record(record).map_err(|e| DaemonError::Malformed(e.to_string()))?;
        let single_op = match bulk.op {
            RecordOp::BulkCreate => RecordOp::Create,
            RecordOp::BulkRemove => RecordOp::Remove,
            _ => RecordOp::Set,
        };

        let mut statuses = Vec::with_capacity(bulk.entries.len());
        for (id, fields) in &bulk.entries {
            let element = Record {
                key: format!("{}:{id}", bulk.object_type.name()),
                fields: fields.clone(),
                op: single_op,
            };
            let result = if self.collecting_view {
                self.collect_into_temp(&element)
            } else {
                self.replay_single(&element)
            };
            match result {
                Ok(()) => statuses.push((id.clone(), STATUS_SUCCESS.to_string())),
                Err(err) => {
                    warn!(element = id, %err, "bulk element failed");
                    statuses.push((id.clone(), format!("{err}")));
                    if bulk.mode == BulkErrorMode::StopOnError {
                        break;
                    }
                }
            }
        }
        Ok(Record::get_response("", STATUS_SUCCESS, statuses))
    }

    /// Load both views, run the diff engine and execute the result, then
    /// promote the temporary view to the new persisted state.
    fn apply_view(&mut self) -> Result<(), DaemonError> {
        let mut current = store::load_view(self.store.as_ref(), ASIC_STATE)?;
        current.id_map = self.id_map.clone();
        let mut temp =
            store::load_view(self.store.as_ref(), &format!("{TEMP_PREFIX}{ASIC_STATE}"))?;

        let config = ApplyConfig {
            seed: self.config.apply_seed,
            non_removable: self.switch.cold_vids().iter().copied().collect::<HashSet<_>>(),
        };
        let ops = apply_view_transition(&mut current, &mut temp, &config)?;
        info!(ops = ops.len(), "applying reconciliation result");

        apply::execute(self.driver.as_ref(), &ops, &current, &mut temp)?;

        // The temporary view, now programmed, becomes the current view.
        // Orphaned non-removable defaults stay live on the ASIC without a
        // temporary counterpart (their RID is bound to no temporary VID);
        // carry their records and bindings over so the next apply still
        // sees them.
        for idx in current.indices() {
            let obj = current.object(idx);
            if obj.status() != asic_view::ObjectStatus::Final {
                continue;
            }
            let Some(vid) = obj.vid() else { continue };
            let Some(rid) = current.id_map.rid(vid) else {
                continue;
            };
            if temp.id_map.vid(rid).is_some() {
                continue;
            }
            temp.insert(obj.clone())?;
            temp.id_map.bind(vid, rid)?;
        }

        store::save_view(self.store.as_ref(), ASIC_STATE, &temp);
        store::save_id_map(self.store.as_ref(), "", &temp.id_map);
        self.store.clear(&format!("{TEMP_PREFIX}{ASIC_STATE}"));
        self.id_map = temp.id_map.clone();
        Ok(())
    }

    /// Drain the operation subject until the connection closes. Fatal
    /// errors (a failed apply) abort the loop; per-record errors are
    /// logged and the stream continues.
    pub async fn run(&mut self, conn: &NatsConnection) -> Result<(), DaemonError> {
        let mut sub = conn.subscribe(subjects::ASIC_OP).await?;
        info!(subject = subjects::ASIC_OP, "listening for records");

        while let Some(msg) = sub.next().await {
            let record: Record = match asic_net::decode(msg.payload.as_ref()) {
                Ok(record) => record,
                Err(err) => {
                    warn!(%err, "undecodable record, skipping");
                    continue;
                }
            };
            match self.handle_record(&record) {
                Ok(Some(response)) => {
                    conn.publish_record(subjects::ASIC_RESPONSE, &response).await?;
                }
                Ok(None) => {}
                Err(err @ (DaemonError::Apply(_) | DaemonError::Exec(_))) => {
                    error!(%err, "reconciliation failed, aborting");
                    return Err(err);
                }
                Err(err) => {
                    warn!(key = record.key, %err, "record failed");
                }
            }
            for (subject, notification) in self.pending_notifications.drain(..) {
                conn.publish_record(&subject, &notification).await?;
            }
        }
        Ok(())
    }

    /// Notifications queued by the last handled record; the run loop
    /// publishes and drains these, tests may inspect them directly.
    #[must_use]
    pub fn pending_notifications(&self) -> &[(String, Record)] {
        &self.pending_notifications
    }
}
