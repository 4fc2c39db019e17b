//! In-process stores used by the test suite and for running the booking core
//! without a database.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::{
        availability::{sort_by_day, AvailabilityBlock},
        session::Session,
    },
    repositories::store::{AvailabilityStore, SessionStore},
    scheduling::{
        calendar::{DayOfWeek, TimeOfDay},
        resolver,
    },
};

/// Availability blocks and sessions held in memory.
///
/// Every operation runs under one async mutex, so the check and the write of
/// an insert cannot interleave with another caller's.
#[derive(Clone, Default)]
pub struct MemoryStore {
    blocks: Arc<Mutex<HashMap<Uuid, AvailabilityBlock>>>,
    sessions: Arc<Mutex<HashMap<Uuid, Session>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AvailabilityStore for MemoryStore {
    async fn list_for_mentor(&self, mentor_id: Uuid) -> Result<Vec<AvailabilityBlock>> {
        let blocks = self.blocks.lock().await;
        let mut found: Vec<_> = blocks
            .values()
            .filter(|b| b.mentor_id == mentor_id)
            .cloned()
            .collect();
        sort_by_day(&mut found);
        Ok(found)
    }

    async fn list_for_mentor_day(
        &self,
        mentor_id: Uuid,
        day: DayOfWeek,
    ) -> Result<Vec<AvailabilityBlock>> {
        let blocks = self.blocks.lock().await;
        let mut found: Vec<_> = blocks
            .values()
            .filter(|b| b.mentor_id == mentor_id && b.day_of_week == day)
            .cloned()
            .collect();
        sort_by_day(&mut found);
        Ok(found)
    }

    async fn insert(&self, block: &AvailabilityBlock) -> Result<()> {
        let mut blocks = self.blocks.lock().await;
        let clash = blocks.values().any(|b| {
            b.mentor_id == block.mentor_id
                && b.day_of_week == block.day_of_week
                && resolver::ranges_overlap(b.start_time, b.end_time, block.start_time, block.end_time)
        });
        if clash {
            return Err(AppError::OverlapDetected);
        }
        blocks.insert(block.id, block.clone());
        Ok(())
    }

    async fn find(&self, block_id: Uuid) -> Result<Option<AvailabilityBlock>> {
        Ok(self.blocks.lock().await.get(&block_id).cloned())
    }

    async fn delete_owned(&self, mentor_id: Uuid, block_id: Uuid) -> Result<bool> {
        let mut blocks = self.blocks.lock().await;
        match blocks.get(&block_id) {
            Some(block) if block.mentor_id == mentor_id => {
                blocks.remove(&block_id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn find_overlapping(
        &self,
        mentor_id: Uuid,
        date: NaiveDate,
        start_time: TimeOfDay,
        end_time: TimeOfDay,
    ) -> Result<Option<Session>> {
        let sessions = self.sessions.lock().await;
        Ok(resolver::clashing_session(mentor_id, date, start_time, end_time, sessions.values()).cloned())
    }

    async fn insert(&self, session: &Session) -> Result<()> {
        let mut sessions = self.sessions.lock().await;
        let clash = resolver::clashing_session(
            session.mentor_id,
            session.date,
            session.start_time,
            session.end_time,
            sessions.values(),
        );
        if clash.is_some() {
            return Err(AppError::Collision);
        }
        sessions.insert(session.id, session.clone());
        Ok(())
    }

    async fn find(&self, session_id: Uuid) -> Result<Option<Session>> {
        Ok(self.sessions.lock().await.get(&session_id).cloned())
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Session>> {
        let sessions = self.sessions.lock().await;
        let mut found: Vec<_> = sessions
            .values()
            .filter(|s| s.involves(user_id))
            .cloned()
            .collect();
        found.sort_by_key(|s| (s.date, s.start_time));
        Ok(found)
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.sessions.lock().await.len() as u64)
    }
}
