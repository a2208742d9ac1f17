use pane_config::errors::PaneConfigError;
use pane_embed::EmbedError;
use pane_links::LinkError;
use pane_model::ModelError;
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum PaneError {
    #[error(transparent)]
    Config(#[from] PaneConfigError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Link(#[from] LinkError),
    #[error(transparent)]
    Embed(#[from] EmbedError),
}
