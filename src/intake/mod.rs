// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

pub mod action;
pub mod draft;
pub mod engine;
pub mod keyboards;
pub mod platform;
pub mod render;
pub mod steps;
pub mod validation;
pub mod view;

#[cfg(test)]
mod tests;

pub use action::Action;
pub use draft::{Session, SessionStore};
pub use engine::{Channels, Engine, EngineSettings};
pub use platform::{ChatPlatform, PlatformError};
pub use view::{Button, ButtonTarget, Reply, View};
