//! tapestry-core: conversion engine between a live DOM and the content model.
//!
//! This crate provides:
//! - Format handlers: per-key parse/apply pairs grouped into categories
//! - `dom_to_content_model` - DOM subtree to model, threading a selection hint
//! - `content_model_to_dom` - model to DOM, reusing cached elements
//! - The model cache: event transitions, DOM index and selection reconciliation
//! - `EditorCore` - per-editor cache slot and the APIs built on it

pub mod cache;
pub mod dom_to_model;
pub mod editor;
pub mod error;
pub mod format;
pub mod model_to_dom;

pub use cache::{
    CacheAction, CacheState, ChangeSource, ContentChangedEvent, DomIndex, EditorEvent, InvalidateReason, KeyDownEvent,
    reconcile_selection, transition,
};
pub use dom_to_model::{DomToModelContext, DomToModelOption, dom_to_content_model};
pub use editor::{ContentForCopy, EditorCore, EditorOptions, Environment, ModelCopyMode, transform_color};
pub use error::{ReconcileError, SelectionError};
pub use format::{DarkColorHandler, FormatCategory, LuminanceDarkColorHandler};
pub use model_to_dom::{ModelToDomContext, ModelToDomOption, content_model_to_dom};
pub use smol_str::SmolStr;
