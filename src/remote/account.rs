//! Signed-in user and remaining credits.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::collaborators::IdentityProvider;

/// Identity supplied by configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    #[serde(default)]
    pub signed_in: bool,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl IdentityProvider for Identity {
    fn is_signed_in(&self) -> bool {
        self.signed_in
    }

    fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }
}

#[derive(Resource, Debug, Default)]
pub struct Account {
    pub identity: Identity,
    /// Last known credit balance; `None` until fetched
    pub credits: Option<i64>,
}

impl Account {
    /// Owner id if the user is signed in.
    pub fn owner(&self) -> Option<&str> {
        if self.identity.is_signed_in() {
            self.identity.user_id().filter(|id| !id.is_empty())
        } else {
            None
        }
    }
}
