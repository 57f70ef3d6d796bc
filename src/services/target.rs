//! Target CRUD with request validation.

use chrono::Utc;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::target::{CreateTarget, IdentifierKind, ScanTarget, TargetIdentifier, UpdateTarget};
use crate::store::TargetStore;

pub fn create(store: &TargetStore, body: &CreateTarget) -> Result<ScanTarget, AppError> {
    validate_name(&body.name)?;
    validate_identifiers(&body.identifiers)?;

    let target = ScanTarget {
        id: Uuid::new_v4(),
        name: body.name.trim().to_string(),
        identifiers: body.identifiers.clone(),
        created_at: Utc::now(),
    };
    store.insert(target.clone());
    tracing::info!(target_id = %target.id, name = %target.name, "target created");
    Ok(target)
}

pub fn get(store: &TargetStore, id: Uuid) -> Result<ScanTarget, AppError> {
    store
        .get(id)
        .ok_or_else(|| AppError::NotFound(format!("Target {id} not found")))
}

pub fn list(store: &TargetStore) -> Vec<ScanTarget> {
    store.list()
}

pub fn update(store: &TargetStore, id: Uuid, body: &UpdateTarget) -> Result<ScanTarget, AppError> {
    if let Some(name) = &body.name {
        validate_name(name)?;
    }
    if let Some(identifiers) = &body.identifiers {
        validate_identifiers(identifiers)?;
    }

    store
        .update(id, |target| {
            if let Some(name) = &body.name {
                target.name = name.trim().to_string();
            }
            if let Some(identifiers) = &body.identifiers {
                target.identifiers = identifiers.clone();
            }
        })
        .ok_or_else(|| AppError::NotFound(format!("Target {id} not found")))
}

pub fn delete(store: &TargetStore, id: Uuid) -> Result<(), AppError> {
    if store.remove(id) {
        Ok(())
    } else {
        Err(AppError::NotFound(format!("Target {id} not found")))
    }
}

fn validate_name(name: &str) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::Validation("name must not be empty".to_string()));
    }
    Ok(())
}

fn validate_identifiers(identifiers: &[TargetIdentifier]) -> Result<(), AppError> {
    for identifier in identifiers {
        if identifier.value.trim().is_empty() {
            return Err(AppError::Validation(
                "identifier value must not be empty".to_string(),
            ));
        }
        if identifier.kind == IdentifierKind::Url
            && !identifier.value.starts_with("http://")
            && !identifier.value.starts_with("https://")
        {
            return Err(AppError::Validation(format!(
                "url identifier must start with http:// or https://: {}",
                identifier.value
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_rejects_empty_name() {
        let store = TargetStore::new();
        let result = create(
            &store,
            &CreateTarget {
                name: "  ".to_string(),
                identifiers: vec![],
            },
        );
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn create_rejects_bad_url_identifier() {
        let store = TargetStore::new();
        let result = create(
            &store,
            &CreateTarget {
                name: "shop".to_string(),
                identifiers: vec![TargetIdentifier {
                    kind: IdentifierKind::Url,
                    value: "ftp://shop.example.com".to_string(),
                }],
            },
        );
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn create_get_update_delete_round_trip() {
        let store = TargetStore::new();
        let created = create(
            &store,
            &CreateTarget {
                name: "shop".to_string(),
                identifiers: vec![TargetIdentifier {
                    kind: IdentifierKind::Npm,
                    value: "lodash@4.17.20".to_string(),
                }],
            },
        )
        .unwrap();

        assert_eq!(get(&store, created.id).unwrap().name, "shop");

        let updated = update(
            &store,
            created.id,
            &UpdateTarget {
                name: Some("shop-v2".to_string()),
                identifiers: None,
            },
        )
        .unwrap();
        assert_eq!(updated.name, "shop-v2");
        assert_eq!(updated.identifiers.len(), 1);

        delete(&store, created.id).unwrap();
        assert!(get(&store, created.id).is_err());
    }

    #[test]
    fn delete_unknown_is_not_found() {
        let store = TargetStore::new();
        assert!(matches!(
            delete(&store, Uuid::new_v4()),
            Err(AppError::NotFound(_))
        ));
    }
}
