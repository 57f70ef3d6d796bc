//! Policy CRUD with request validation.

use chrono::Utc;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::policy::{CreatePolicy, ScanPolicy, ToolKind, UpdatePolicy};
use crate::store::PolicyStore;

pub fn create(store: &PolicyStore, body: &CreatePolicy) -> Result<ScanPolicy, AppError> {
    validate_name(&body.name)?;
    let allowed_tools = validate_tools(&body.allowed_tools)?;
    validate_limits(body.max_req_per_min, body.spider_depth)?;

    let policy = ScanPolicy {
        id: Uuid::new_v4(),
        name: body.name.trim().to_string(),
        allowed_tools,
        max_req_per_min: body.max_req_per_min,
        spider_depth: body.spider_depth,
        exclusions: body.exclusions.clone(),
        scan_mode: body.scan_mode,
        created_at: Utc::now(),
    };
    store.insert(policy.clone());
    tracing::info!(policy_id = %policy.id, name = %policy.name, "policy created");
    Ok(policy)
}

pub fn get(store: &PolicyStore, id: Uuid) -> Result<ScanPolicy, AppError> {
    store
        .get(id)
        .ok_or_else(|| AppError::NotFound(format!("Policy {id} not found")))
}

pub fn list(store: &PolicyStore) -> Vec<ScanPolicy> {
    store.list()
}

pub fn update(store: &PolicyStore, id: Uuid, body: &UpdatePolicy) -> Result<ScanPolicy, AppError> {
    if let Some(name) = &body.name {
        validate_name(name)?;
    }
    let deduped_tools = match &body.allowed_tools {
        Some(tools) => Some(validate_tools(tools)?),
        None => None,
    };
    validate_limits(
        body.max_req_per_min.unwrap_or(1),
        body.spider_depth.unwrap_or(1),
    )?;

    store
        .update(id, |policy| {
            if let Some(name) = &body.name {
                policy.name = name.trim().to_string();
            }
            if let Some(tools) = deduped_tools {
                policy.allowed_tools = tools;
            }
            if let Some(limit) = body.max_req_per_min {
                policy.max_req_per_min = limit;
            }
            if let Some(depth) = body.spider_depth {
                policy.spider_depth = depth;
            }
            if let Some(exclusions) = &body.exclusions {
                policy.exclusions = exclusions.clone();
            }
            if let Some(mode) = body.scan_mode {
                policy.scan_mode = mode;
            }
        })
        .ok_or_else(|| AppError::NotFound(format!("Policy {id} not found")))
}

pub fn delete(store: &PolicyStore, id: Uuid) -> Result<(), AppError> {
    if store.remove(id) {
        Ok(())
    } else {
        Err(AppError::NotFound(format!("Policy {id} not found")))
    }
}

fn validate_name(name: &str) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::Validation("name must not be empty".to_string()));
    }
    Ok(())
}

/// Dedup while preserving the caller's order; at least one tool must
/// remain.
fn validate_tools(tools: &[ToolKind]) -> Result<Vec<ToolKind>, AppError> {
    let mut seen = std::collections::HashSet::new();
    let deduped: Vec<ToolKind> = tools.iter().copied().filter(|t| seen.insert(*t)).collect();
    if deduped.is_empty() {
        return Err(AppError::Validation(
            "allowed_tools must name at least one tool".to_string(),
        ));
    }
    Ok(deduped)
}

fn validate_limits(max_req_per_min: u32, spider_depth: u32) -> Result<(), AppError> {
    if max_req_per_min == 0 {
        return Err(AppError::Validation(
            "max_req_per_min must be at least 1".to_string(),
        ));
    }
    if spider_depth == 0 {
        return Err(AppError::Validation(
            "spider_depth must be at least 1".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::policy::ScanMode;

    fn body() -> CreatePolicy {
        CreatePolicy {
            name: "baseline".to_string(),
            allowed_tools: vec![ToolKind::WebScan, ToolKind::Dependency],
            max_req_per_min: 60,
            spider_depth: 5,
            exclusions: vec!["*/admin/*".to_string()],
            scan_mode: ScanMode::Passive,
        }
    }

    #[test]
    fn create_and_get() {
        let store = PolicyStore::new();
        let created = create(&store, &body()).unwrap();
        let fetched = get(&store, created.id).unwrap();
        assert_eq!(fetched.name, "baseline");
        assert_eq!(fetched.exclusions, vec!["*/admin/*"]);
    }

    #[test]
    fn create_rejects_empty_tools() {
        let store = PolicyStore::new();
        let mut b = body();
        b.allowed_tools = vec![];
        assert!(matches!(create(&store, &b), Err(AppError::Validation(_))));
    }

    #[test]
    fn create_rejects_zero_limits() {
        let store = PolicyStore::new();
        let mut b = body();
        b.spider_depth = 0;
        assert!(matches!(create(&store, &b), Err(AppError::Validation(_))));

        let mut b = body();
        b.max_req_per_min = 0;
        assert!(matches!(create(&store, &b), Err(AppError::Validation(_))));
    }

    #[test]
    fn duplicate_tools_deduped_preserving_order() {
        let store = PolicyStore::new();
        let mut b = body();
        b.allowed_tools = vec![
            ToolKind::Dependency,
            ToolKind::WebScan,
            ToolKind::Dependency,
        ];
        let created = create(&store, &b).unwrap();
        assert_eq!(
            created.allowed_tools,
            vec![ToolKind::Dependency, ToolKind::WebScan]
        );
    }

    #[test]
    fn update_changes_only_given_fields() {
        let store = PolicyStore::new();
        let created = create(&store, &body()).unwrap();
        let updated = update(
            &store,
            created.id,
            &UpdatePolicy {
                spider_depth: Some(10),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(updated.spider_depth, 10);
        assert_eq!(updated.name, "baseline");
        assert_eq!(updated.max_req_per_min, 60);
    }

    #[test]
    fn delete_unknown_is_not_found() {
        let store = PolicyStore::new();
        assert!(matches!(
            delete(&store, Uuid::new_v4()),
            Err(AppError::NotFound(_))
        ));
    }
}
