//! Error types for jules-resolver.

use jules_core::{ProjectName, StageName};
use thiserror::Error;

/// Why a (stage, project) pair could not be turned into a command.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The project is not present in the configuration.
    #[error("project '{project}' is not configured")]
    UnknownProject { project: ProjectName },

    /// Neither the project nor the global stages define a template.
    #[error("no command configured for stage '{stage}' in project '{project}'")]
    NoCommand {
        stage: StageName,
        project: ProjectName,
    },

    /// The project explicitly opts out of the stage.
    #[error("project '{project}' skips stage '{stage}'")]
    Skipped {
        stage: StageName,
        project: ProjectName,
    },

    /// Tera failed to parse or render the template.
    #[error("failed to render '{stage}' command for '{project}': {source}")]
    Template {
        stage: StageName,
        project: ProjectName,
        #[source]
        source: tera::Error,
    },

    /// The template rendered to whitespace only.
    #[error("'{stage}' command for '{project}' rendered empty")]
    EmptyCommand {
        stage: StageName,
        project: ProjectName,
    },
}
