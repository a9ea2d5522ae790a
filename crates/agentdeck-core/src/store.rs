//! Process-wide record storage.
//!
//! The [`RecordStore`] keeps agents, executions and agent-tool associations
//! in concurrent keyed maps for the lifetime of the process. Nothing is
//! persisted across restarts.
//!
//! # Semantics
//!
//! - **Upsert**: [`RecordStore::save`] replaces the whole record; the last
//!   write wins and no version token is checked.
//! - **Not found**: lookups return `None`; callers decide how to surface it.
//! - **Ordering**: [`RecordStore::list`] returns records in no meaningful
//!   order. Sort at the call site.
//! - **Retention**: executions are never evicted.
//!
//! # Example
//!
//! ```rust
//! use agentdeck_core::{Agent, AgentDraft, AgentStatus, RecordStore};
//!
//! let store = RecordStore::new();
//! let agent = Agent::from_draft(
//!     AgentDraft {
//!         agent_name: "Bot".into(),
//!         instructions: "help".into(),
//!         foundation_model: "amazon.titan-text-lite-v1".into(),
//!         ..Default::default()
//!     },
//!     AgentStatus::Prepared,
//! );
//! store.save(agent.clone());
//!
//! assert_eq!(store.get::<Agent>(&agent.id), Some(agent.clone()));
//! assert!(store.delete::<Agent>(&agent.id).is_some());
//! assert!(store.get::<Agent>(&agent.id).is_none());
//! ```

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::debug;

use crate::error::{CoreError, CoreResult};
use crate::model::{Agent, AgentTool, Execution};

/// A record kind held by the [`RecordStore`]
pub trait Record: Clone + Send + Sync + 'static {
    /// Human-readable kind, used in errors and logs
    const KIND: &'static str;

    /// Key the record is stored under
    fn key(&self) -> String;

    /// The map holding records of this kind
    fn table(store: &RecordStore) -> &DashMap<String, Self>;
}

impl Record for Agent {
    const KIND: &'static str = "Agent";

    fn key(&self) -> String {
        self.id.clone()
    }

    fn table(store: &RecordStore) -> &DashMap<String, Self> {
        &store.agents
    }
}

impl Record for Execution {
    const KIND: &'static str = "Execution";

    fn key(&self) -> String {
        self.id.clone()
    }

    fn table(store: &RecordStore) -> &DashMap<String, Self> {
        &store.executions
    }
}

impl Record for AgentTool {
    const KIND: &'static str = "AgentTool";

    fn key(&self) -> String {
        AgentTool::key_for(&self.agent_id, &self.tool_id)
    }

    fn table(store: &RecordStore) -> &DashMap<String, Self> {
        &store.agent_tools
    }
}

/// In-memory keyed maps for every record kind
#[derive(Debug, Default)]
pub struct RecordStore {
    agents: DashMap<String, Agent>,
    executions: DashMap<String, Execution>,
    agent_tools: DashMap<String, AgentTool>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<R: Record>(&self, key: &str) -> Option<R> {
        R::table(self).get(key).map(|entry| entry.value().clone())
    }

    /// Insert or replace a record.
    pub fn save<R: Record>(&self, record: R) {
        let key = record.key();
        debug!(kind = R::KIND, key = %key, "Saving record");
        R::table(self).insert(key, record);
    }

    /// Insert a record only if its key is free.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Duplicate`] when a record with the same key exists.
    pub fn insert_new<R: Record>(&self, record: R) -> CoreResult<R> {
        match R::table(self).entry(record.key()) {
            Entry::Occupied(entry) => Err(CoreError::duplicate(R::KIND, entry.key().clone())),
            Entry::Vacant(entry) => {
                debug!(kind = R::KIND, key = %entry.key(), "Inserting record");
                entry.insert(record.clone());
                Ok(record)
            }
        }
    }

    /// Apply `f` to a stored record while holding its entry lock.
    ///
    /// Returns the updated record, or `None` if the key is unknown.
    pub fn update<R: Record>(&self, key: &str, f: impl FnOnce(&mut R)) -> Option<R> {
        R::table(self).get_mut(key).map(|mut entry| {
            f(entry.value_mut());
            entry.value().clone()
        })
    }

    pub fn delete<R: Record>(&self, key: &str) -> Option<R> {
        let removed = R::table(self).remove(key).map(|(_, record)| record);
        if removed.is_some() {
            debug!(kind = R::KIND, key = %key, "Deleted record");
        }
        removed
    }

    pub fn list<R: Record>(&self) -> Vec<R> {
        R::table(self)
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn len<R: Record>(&self) -> usize {
        R::table(self).len()
    }

    pub fn is_empty<R: Record>(&self) -> bool {
        R::table(self).is_empty()
    }

    /// Executions owned by an agent, newest first
    pub fn executions_for_agent(&self, agent_id: &str) -> Vec<Execution> {
        let mut executions: Vec<Execution> = self
            .executions
            .iter()
            .filter(|entry| entry.value().agent_id == agent_id)
            .map(|entry| entry.value().clone())
            .collect();
        executions.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        executions
    }

    /// Tool associations of an agent, ordered by priority then creation
    pub fn tools_for_agent(&self, agent_id: &str) -> Vec<AgentTool> {
        let mut tools: Vec<AgentTool> = self
            .agent_tools
            .iter()
            .filter(|entry| entry.value().agent_id == agent_id)
            .map(|entry| entry.value().clone())
            .collect();
        tools.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then_with(|| a.created_at.cmp(&b.created_at))
        });
        tools
    }

    pub fn find_agent_tool(&self, agent_id: &str, tool_id: &str) -> Option<AgentTool> {
        self.get(&AgentTool::key_for(agent_id, tool_id))
    }

    /// Remove every tool association of an agent. Returns how many were removed.
    pub fn remove_tools_for_agent(&self, agent_id: &str) -> usize {
        let before = self.agent_tools.len();
        self.agent_tools.retain(|_, link| link.agent_id != agent_id);
        before.saturating_sub(self.agent_tools.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AgentDraft, AgentStatus};
    use std::sync::Arc;

    fn agent(name: &str) -> Agent {
        Agent::from_draft(
            AgentDraft {
                agent_name: name.into(),
                instructions: "help".into(),
                foundation_model: "m".into(),
                ..Default::default()
            },
            AgentStatus::Prepared,
        )
    }

    #[test]
    fn test_save_get_delete() {
        let store = RecordStore::new();
        let agent = agent("Bot");
        store.save(agent.clone());

        assert_eq!(store.get::<Agent>(&agent.id), Some(agent.clone()));
        assert_eq!(store.len::<Agent>(), 1);

        assert!(store.delete::<Agent>(&agent.id).is_some());
        assert!(store.get::<Agent>(&agent.id).is_none());
        assert!(store.delete::<Agent>(&agent.id).is_none());
        assert!(store.is_empty::<Agent>());
    }

    #[test]
    fn test_save_is_last_write_wins() {
        let store = RecordStore::new();
        let mut agent = agent("Bot");
        store.save(agent.clone());
        agent.agent_name = "Renamed".into();
        store.save(agent.clone());

        assert_eq!(store.len::<Agent>(), 1);
        assert_eq!(store.get::<Agent>(&agent.id).unwrap().agent_name, "Renamed");
    }

    #[test]
    fn test_kinds_are_isolated() {
        let store = RecordStore::new();
        let agent = agent("Bot");
        store.save(agent.clone());
        assert!(store.get::<Execution>(&agent.id).is_none());
        assert!(store.list::<Execution>().is_empty());
    }

    #[test]
    fn test_insert_new_rejects_duplicate_association() {
        let store = RecordStore::new();
        store.insert_new(AgentTool::new("a1", "calculator")).unwrap();

        let err = store
            .insert_new(AgentTool::new("a1", "calculator"))
            .unwrap_err();
        assert!(matches!(err, CoreError::Duplicate { kind: "AgentTool", .. }));

        store.delete::<AgentTool>(&AgentTool::key_for("a1", "calculator"));
        assert!(store.insert_new(AgentTool::new("a1", "calculator")).is_ok());
    }

    #[test]
    fn test_concurrent_attach_admits_one() {
        let store = Arc::new(RecordStore::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    store.insert_new(AgentTool::new("a1", "calculator")).is_ok()
                })
            })
            .collect();
        let admitted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(admitted, 1);
        assert_eq!(store.len::<AgentTool>(), 1);
    }

    #[test]
    fn test_update_in_place() {
        let store = RecordStore::new();
        let agent = agent("Bot");
        store.save(agent.clone());

        let updated = store
            .update::<Agent>(&agent.id, |a| a.record_execution())
            .unwrap();
        assert_eq!(updated.execution_count, 1);
        assert!(store.update::<Agent>("missing", |a| a.record_execution()).is_none());
    }

    #[test]
    fn test_agent_scoped_queries() {
        let store = RecordStore::new();
        store.save(AgentTool::new("a1", "calculator"));
        store.save(AgentTool::new("a1", "text_analyze").with_priority(5));
        store.save(AgentTool::new("a2", "calculator"));

        let tools = store.tools_for_agent("a1");
        assert_eq!(tools.len(), 2);
        assert_eq!(tools[0].tool_id, "text_analyze");

        assert_eq!(store.remove_tools_for_agent("a1"), 2);
        assert_eq!(store.len::<AgentTool>(), 1);
        assert!(store.find_agent_tool("a2", "calculator").is_some());

        store.save(Execution::start("a1", "x", None));
        store.save(Execution::start("a2", "y", None));
        assert_eq!(store.executions_for_agent("a1").len(), 1);
    }
}
