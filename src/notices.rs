//! Transient and persistent user notices.

use bevy::prelude::*;

use crate::constants::NOTICE_LIFETIME_SECS;
use crate::remote::GenerationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

#[derive(Debug, Clone)]
pub struct Notice {
    pub id: u64,
    pub level: NoticeLevel,
    pub message: String,
    /// Persistent notices stay until closed
    pub persistent: bool,
    pub age_secs: f32,
}

#[derive(Resource, Default)]
pub struct Notices {
    items: Vec<Notice>,
    next_id: u64,
}

impl Notices {
    pub fn push(&mut self, level: NoticeLevel, message: impl Into<String>, persistent: bool) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.items.push(Notice {
            id,
            level,
            message: message.into(),
            persistent,
            age_secs: 0.0,
        });
        id
    }

    pub fn info(&mut self, message: impl Into<String>) -> u64 {
        self.push(NoticeLevel::Info, message, false)
    }

    pub fn error(&mut self, message: impl Into<String>) -> u64 {
        self.push(NoticeLevel::Error, message, false)
    }

    pub fn persistent_info(&mut self, message: impl Into<String>) -> u64 {
        self.push(NoticeLevel::Info, message, true)
    }

    /// Surface a failed operation to the user.
    pub fn report(&mut self, err: &GenerationError) -> u64 {
        warn!("{}", err);
        self.push(NoticeLevel::Error, err.to_string(), err.is_persistent())
    }

    pub fn dismiss(&mut self, id: u64) {
        self.items.retain(|n| n.id != id);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notice> {
        self.items.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Age every notice and drop expired transient ones.
    pub fn tick(&mut self, delta_secs: f32) {
        for notice in &mut self.items {
            notice.age_secs += delta_secs;
        }
        self.items
            .retain(|n| n.persistent || n.age_secs < NOTICE_LIFETIME_SECS);
    }
}

pub fn expire_notices(time: Res<Time>, mut notices: ResMut<Notices>) {
    if !notices.is_empty() {
        notices.tick(time.delta_secs());
    }
}
