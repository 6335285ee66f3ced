// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for data view validation.

use crate::host::InputState;
use crate::matrix::Role;

/// Result type alias for data view operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Input-shape errors. All of them are recoverable by fixing the data binding.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The update carried no matrix data view at all.
    #[error("data does not contain a matrix data view")]
    NoMatrixView,

    /// No hierarchy level declares a mandatory role.
    #[error("missing {} input (role `{}`)", .0.input_name(), .0)]
    MissingRole(Role),
}

impl Error {
    /// The role that caused the failure, if any.
    pub fn missing_role(&self) -> Option<Role> {
        match self {
            Error::MissingRole(role) => Some(*role),
            Error::NoMatrixView => None,
        }
    }

    /// Landing page status for this failure. A partial binding is
    /// incomplete; an update without any matrix view is invalid.
    pub fn input_state(&self) -> InputState {
        match self {
            Error::MissingRole(_) => InputState::Incomplete,
            Error::NoMatrixView => InputState::Invalid,
        }
    }
}
