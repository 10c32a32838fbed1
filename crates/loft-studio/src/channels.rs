//! Channel vocabulary of the studio backend.
//!
//! One constant per channel so the typed client and the contract table can
//! never drift apart on spelling. [`studio_contracts`] registers the shape
//! of every known channel; channels without a contract stay invokable as
//! opaque pass-through.

use loft_ipc::schema::{ChannelContract, ContractRegistry, ValueKind};

/// Recent project list for the landing page.
pub const GET_RECENT_PROJECTS: &str = "get-recent-projects";
/// Move a project descriptor to the front of the recents list.
pub const ADD_RECENT_PROJECT: &str = "add-recent-project";
/// Scaffold a new fine-tuning project.
pub const CREATE_NEW_PROJECT: &str = "create-new-project";
/// Delete a project folder from disk.
pub const DELETE_PROJECT_FOLDER: &str = "delete-project-folder";
/// Read the persisted UI language.
pub const GET_LANGUAGE: &str = "get-language";
/// Persist the UI language.
pub const SET_LANGUAGE: &str = "set-language";
/// Read the persisted UI theme.
pub const GET_THEME: &str = "get-theme";
/// Persist the UI theme.
pub const SET_THEME: &str = "set-theme";
/// Host platform string.
pub const GET_PLATFORM: &str = "get-platform";
/// Training backend readiness.
pub const GET_BACKEND_STATUS: &str = "get-backend-status";
/// Launch a training job.
pub const RUN_TRAINING_JOB: &str = "run-training-job";

/// Push-emulated channel carrying CPU/GPU/memory samples.
pub const SYSTEM_USAGE: &str = "system-usage";
/// Backend channel the system-usage poll invokes.
pub const GET_SYSTEM_USAGE: &str = "get-system-usage";
/// Push-emulated channel carrying training progress.
pub const TRAINING_STATUS: &str = "training-status";
/// Backend channel the training-status poll invokes.
pub const GET_TRAINING_STATUS: &str = "get-training-status";

/// Contract table for every studio channel with a known shape.
#[must_use]
pub fn studio_contracts() -> ContractRegistry {
    let mut contracts = ContractRegistry::new();

    // Projects
    contracts.register(
        GET_RECENT_PROJECTS,
        ChannelContract::no_args().with_response(ValueKind::Array),
    );
    // Takes a project descriptor object and answers with the updated list.
    contracts.register(
        ADD_RECENT_PROJECT,
        ChannelContract::new(vec![ValueKind::Object]).with_response(ValueKind::Array),
    );
    contracts.register(
        CREATE_NEW_PROJECT,
        ChannelContract::new(vec![ValueKind::String]).with_response(ValueKind::Object),
    );
    contracts.register(
        DELETE_PROJECT_FOLDER,
        ChannelContract::new(vec![ValueKind::String]).with_response(ValueKind::Object),
    );

    // Preferences
    contracts.register(
        GET_LANGUAGE,
        ChannelContract::no_args().with_response(ValueKind::String),
    );
    contracts.register(SET_LANGUAGE, ChannelContract::new(vec![ValueKind::String]));
    contracts.register(
        GET_THEME,
        ChannelContract::no_args().with_response(ValueKind::String),
    );
    contracts.register(SET_THEME, ChannelContract::new(vec![ValueKind::String]));

    // Host + backend
    contracts.register(
        GET_PLATFORM,
        ChannelContract::no_args().with_response(ValueKind::String),
    );
    contracts.register(
        GET_BACKEND_STATUS,
        ChannelContract::no_args().with_response(ValueKind::Object),
    );
    contracts.register(
        RUN_TRAINING_JOB,
        ChannelContract::new(vec![ValueKind::Object]).with_response(ValueKind::Object),
    );

    // Poll sources behind the push-emulated channels
    contracts.register(
        GET_SYSTEM_USAGE,
        ChannelContract::no_args().with_response(ValueKind::Object),
    );
    contracts.register(
        GET_TRAINING_STATUS,
        ChannelContract::no_args().with_response(ValueKind::Object),
    );

    contracts
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn every_invokable_channel_has_a_contract() {
        let contracts = studio_contracts();
        for channel in [
            GET_RECENT_PROJECTS,
            ADD_RECENT_PROJECT,
            CREATE_NEW_PROJECT,
            DELETE_PROJECT_FOLDER,
            GET_LANGUAGE,
            SET_LANGUAGE,
            GET_THEME,
            SET_THEME,
            GET_PLATFORM,
            GET_BACKEND_STATUS,
            RUN_TRAINING_JOB,
            GET_SYSTEM_USAGE,
            GET_TRAINING_STATUS,
        ] {
            assert!(contracts.contract(channel).is_some(), "{channel}");
        }
    }

    #[test]
    fn emulated_channels_have_no_request_contract() {
        // Listeners subscribe to these; nothing invokes them directly.
        let contracts = studio_contracts();
        assert!(contracts.contract(SYSTEM_USAGE).is_none());
        assert!(contracts.contract(TRAINING_STATUS).is_none());
    }

    #[test]
    fn create_project_requires_a_name() {
        let contracts = studio_contracts();
        assert!(contracts.check_request(CREATE_NEW_PROJECT, &[]).is_err());
        assert!(contracts
            .check_request(CREATE_NEW_PROJECT, &[json!("bert-finetune")])
            .is_ok());
        assert!(contracts
            .check_request(CREATE_NEW_PROJECT, &[json!(42)])
            .is_err());
    }

    #[test]
    fn getters_take_no_arguments() {
        let contracts = studio_contracts();
        assert!(contracts.check_request(GET_THEME, &[]).is_ok());
        assert!(contracts.check_request(GET_THEME, &[json!("dark")]).is_err());
    }

    #[test]
    fn status_response_shape_is_checked() {
        let contracts = studio_contracts();
        assert!(contracts
            .response_mismatch(GET_BACKEND_STATUS, &json!({"ready": true}))
            .is_none());
        assert!(contracts
            .response_mismatch(GET_BACKEND_STATUS, &json!("ready"))
            .is_some());
    }

    #[test]
    fn unknown_channels_pass_through() {
        let contracts = studio_contracts();
        assert!(contracts
            .check_request("export-model", &[json!({"format": "gguf"})])
            .is_ok());
    }
}
