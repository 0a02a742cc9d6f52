//! Tenant context resolution.
//!
//! Every data-access operation takes a resolved [`TenantScope`] as an
//! explicit argument; nothing in the core reads tenant identity from ambient
//! state. Resolution precedence: explicit hint, then single membership, then
//! superuser-unscoped (reads only), then none.

use uuid::Uuid;

use crate::error::AppError;

/// The authenticated caller, as established by the auth collaborator.
#[derive(Debug, Clone)]
pub struct Principal {
    pub user_id: Uuid,
    pub is_superuser: bool,
    /// Schools this user owns or is an explicit member of.
    pub school_ids: Vec<Uuid>,
}

impl Principal {
    pub fn is_member_of(&self, school_id: Uuid) -> bool {
        self.school_ids.contains(&school_id)
    }
}

/// Whether the operation reads or mutates tenant data. Unscoped admin access
/// is read-only; a missing tenant blocks writes but not reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessKind {
    Read,
    Write,
}

/// Resolved tenant scope for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TenantScope {
    /// All queries filter to this school.
    School(Uuid),
    /// Superuser read path: no tenant filter.
    Unscoped,
    /// No resolvable tenant. Reads yield empty results; writes were already
    /// rejected by [`resolve_tenant`].
    None,
}

impl TenantScope {
    pub fn school_id(&self) -> Option<Uuid> {
        match self {
            TenantScope::School(id) => Some(*id),
            _ => None,
        }
    }

    /// The school id, or `NoTenantFound` - for operations that must be
    /// pinned to a single tenant regardless of superuser capability.
    pub fn require_school(&self) -> Result<Uuid, AppError> {
        self.school_id().ok_or_else(|| {
            AppError::NoTenantFound(
                "This operation requires a school context; supply an X-School-Id header"
                    .to_string(),
            )
        })
    }
}

/// Resolve the active tenant for a request.
///
/// - Explicit hint: the principal must be a member (superusers are exempt),
///   otherwise `AccessDenied`.
/// - No hint, exactly one membership: that school.
/// - No hint, superuser: unscoped, read paths only.
/// - Otherwise none: `NoTenantFound` for writes, `TenantScope::None` for
///   reads (callers treat it as an empty result set).
pub fn resolve_tenant(
    principal: &Principal,
    hint: Option<Uuid>,
    access: AccessKind,
) -> Result<TenantScope, AppError> {
    if let Some(school_id) = hint {
        if principal.is_superuser || principal.is_member_of(school_id) {
            return Ok(TenantScope::School(school_id));
        }
        return Err(AppError::AccessDenied(
            "You are not a member of the requested school".to_string(),
        ));
    }

    if principal.school_ids.len() == 1 {
        return Ok(TenantScope::School(principal.school_ids[0]));
    }

    if principal.is_superuser && access == AccessKind::Read {
        return Ok(TenantScope::Unscoped);
    }

    match access {
        AccessKind::Read => Ok(TenantScope::None),
        AccessKind::Write => Err(AppError::NoTenantFound(if principal.school_ids.is_empty() {
            "You do not belong to any school".to_string()
        } else {
            "You belong to multiple schools; supply an X-School-Id header".to_string()
        })),
    }
}
