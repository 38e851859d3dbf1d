mod auth;
mod config_cmd;
mod favorite;
mod helpers;
mod recipe;
mod share;
mod stats;

use anyhow::{Context, Result};
use std::process;
use std::sync::Arc;

use larder_core::models::{Recipe, RecipeId};
use larder_core::session::SessionSource;
use larder_core::{EntityStore, MutationCoordinator, ShareResolver};

use crate::client::{RecipeServiceClient, is_auth_rejection};
use crate::config::Config;
use crate::platform::TerminalShare;
use crate::session_file::FileSession;

use helpers::json_error;

pub(crate) use auth::{cmd_auth_logout, cmd_auth_status, cmd_auth_token};
pub(crate) use config_cmd::cmd_config_show;
pub(crate) use favorite::cmd_fav;
pub(crate) use recipe::{ListView, cmd_create, cmd_delete, cmd_list, cmd_show};
pub(crate) use share::cmd_share;
pub(crate) use stats::cmd_stats;

/// Everything a command needs to talk to the service for one run.
pub(crate) struct App {
    coordinator: MutationCoordinator,
    share: ShareResolver,
    session: Arc<FileSession>,
}

impl App {
    pub(crate) fn open(config: &Config) -> Result<Self> {
        let session = Arc::new(FileSession::load(&config.session_path())?);
        let client = Arc::new(RecipeServiceClient::new(&config.api_base_url.value)?);
        let store = Arc::new(EntityStore::new(session.current_user()));
        let coordinator =
            MutationCoordinator::new(store, client.clone(), client, session.clone());
        let share = ShareResolver::new(
            config.share_base_url.value.as_str(),
            Arc::new(TerminalShare::new(config.qr_share.value)),
        );
        Ok(Self {
            coordinator,
            share,
            session,
        })
    }

    /// Fetches all collections into the store.
    pub(crate) async fn load(&self) -> Result<()> {
        if let Err(e) = self.coordinator.refresh_all().await {
            if is_auth_rejection(&e) {
                return Err(e).context("Session was rejected; run `larder auth token` again");
            }
            return Err(e).context("Failed to load recipes");
        }
        Ok(())
    }

    pub(crate) fn store(&self) -> &EntityStore {
        self.coordinator.store()
    }

    pub(crate) fn logged_in(&self) -> bool {
        self.session.credential().is_some()
    }

    /// Looks a recipe up in the loaded store; exits with status 2 if absent.
    pub(crate) fn recipe_or_exit(&self, id: &str, json: bool) -> Recipe {
        match self.store().recipe(&RecipeId::new(id)) {
            Some(recipe) => recipe,
            None => {
                let msg = format!("Recipe '{id}' not found");
                if json {
                    println!("{}", json_error(&msg));
                } else {
                    eprintln!("{msg}");
                }
                process::exit(2);
            }
        }
    }
}
