// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Data view validation.

use crate::error::{Error, Result};
use crate::matrix::{MatrixView, Role, VisualUpdateOptions};

/// A matrix view with all mandatory roles bound.
#[derive(Debug, Clone, Copy)]
pub struct ValidatedView<'a> {
    /// `objectColorBy` is bound on some level.
    pub has_color_filter: bool,
    pub view: &'a MatrixView,
}

/// Check the first data view for the `stream`, `parentObject` and `object`
/// roles and detect the optional `objectColorBy` role.
pub fn validate_matrix_view(options: &VisualUpdateOptions) -> Result<ValidatedView<'_>> {
    let view = options
        .first_view()
        .and_then(|v| v.matrix.as_ref())
        .ok_or(Error::NoMatrixView)?;

    let bound = |role: Role| {
        view.rows
            .levels
            .iter()
            .flat_map(|level| level.sources.iter())
            .any(|source| source.has_role(role))
    };

    for role in [Role::Stream, Role::ParentObject, Role::Object] {
        if !bound(role) {
            return Err(Error::MissingRole(role));
        }
    }

    Ok(ValidatedView {
        has_color_filter: bound(Role::ObjectColorBy),
        view,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::{MatrixHierarchy, MatrixLevel};

    fn options_with(roles: &[Role]) -> VisualUpdateOptions {
        VisualUpdateOptions::data(MatrixView {
            rows: MatrixHierarchy {
                levels: roles.iter().map(|r| MatrixLevel::for_role(*r)).collect(),
                ..Default::default()
            },
            ..Default::default()
        })
    }

    #[test]
    fn accepts_mandatory_roles() {
        let options = options_with(&[Role::Stream, Role::ParentObject, Role::Object]);
        let validated = validate_matrix_view(&options).unwrap();
        assert!(!validated.has_color_filter);
    }

    #[test]
    fn detects_color_role() {
        let options = options_with(&[
            Role::Stream,
            Role::ParentObject,
            Role::ObjectColorBy,
            Role::Object,
        ]);
        assert!(validate_matrix_view(&options).unwrap().has_color_filter);
    }

    #[test]
    fn reports_each_missing_role() {
        let cases = [
            (vec![Role::ParentObject, Role::Object], Role::Stream),
            (vec![Role::Stream, Role::Object], Role::ParentObject),
            (vec![Role::Stream, Role::ParentObject, Role::ObjectColorBy], Role::Object),
        ];
        for (roles, missing) in cases {
            let err = validate_matrix_view(&options_with(&roles)).unwrap_err();
            assert_eq!(err, Error::MissingRole(missing));
            assert_eq!(err.missing_role().unwrap().as_str(), missing.as_str());
        }
    }

    #[test]
    fn stream_is_reported_first() {
        let err = validate_matrix_view(&options_with(&[])).unwrap_err();
        assert_eq!(err, Error::MissingRole(Role::Stream));
        assert!(err.to_string().contains("`stream`"));
    }

    #[test]
    fn rejects_missing_matrix() {
        let options = VisualUpdateOptions::default();
        assert_eq!(validate_matrix_view(&options).unwrap_err(), Error::NoMatrixView);
    }
}
