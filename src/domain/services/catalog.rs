use std::sync::Arc;
use tracing::{info, warn};
use crate::domain::models::{branch::Branch, professional::Professional, service::Service, tenant::Tenant};
use crate::domain::ports::{CatalogRepository, TenantRepository};
use crate::domain::services::availability::ProfessionalSelector;
use crate::error::AppError;

/// A bookable (service, branch) pair and the professionals who may take it.
#[derive(Debug, Clone)]
pub struct Offering {
    pub service: Service,
    pub branch: Branch,
    pub professionals: Vec<Professional>,
}

pub struct CatalogService {
    tenant_repo: Arc<dyn TenantRepository>,
    catalog_repo: Arc<dyn CatalogRepository>,
}

impl CatalogService {
    pub fn new(tenant_repo: Arc<dyn TenantRepository>, catalog_repo: Arc<dyn CatalogRepository>) -> Self {
        Self { tenant_repo, catalog_repo }
    }

    pub fn ensure_open(tenant: &Tenant) -> Result<(), AppError> {
        if tenant.bookings_blocked {
            info!("Tenant {} has bookings blocked", tenant.slug);
            return Err(AppError::BookingsBlocked);
        }
        Ok(())
    }

    pub async fn resolve_tenant(&self, slug: &str) -> Result<Tenant, AppError> {
        let tenant = self.tenant_repo.find_by_slug(slug).await?
            .ok_or(AppError::NotFound("Tenant not found".into()))?;
        Self::ensure_open(&tenant)?;
        Ok(tenant)
    }

    pub async fn list_services(&self, tenant: &Tenant) -> Result<Vec<Service>, AppError> {
        Self::ensure_open(tenant)?;
        self.catalog_repo.list_services(&tenant.id).await
    }

    pub async fn list_branches_for_service(&self, tenant: &Tenant, service_id: &str) -> Result<Vec<Branch>, AppError> {
        Self::ensure_open(tenant)?;
        let service = self.active_service(tenant, service_id).await?;
        self.catalog_repo.list_branches_for_service(&tenant.id, &service.id).await
    }

    pub async fn list_professionals(&self, tenant: &Tenant, service_id: &str, branch_id: &str) -> Result<Vec<Professional>, AppError> {
        Self::ensure_open(tenant)?;
        let service = self.active_service(tenant, service_id).await?;
        let branch = self.offered_branch(tenant, &service, Some(branch_id)).await?;
        self.catalog_repo.list_professionals(&tenant.id, &service.id, &branch.id).await
    }

    /// Resolves the pair a booking or availability query targets. For a
    /// specific professional the list holds exactly that professional; for
    /// `Any` it holds every eligible one and may be empty.
    pub async fn resolve_offering(
        &self,
        tenant: &Tenant,
        service_id: &str,
        branch_id: Option<&str>,
        selector: &ProfessionalSelector,
    ) -> Result<Offering, AppError> {
        Self::ensure_open(tenant)?;
        let service = self.active_service(tenant, service_id).await?;
        let branch = self.offered_branch(tenant, &service, branch_id).await?;
        let eligible = self.catalog_repo.list_professionals(&tenant.id, &service.id, &branch.id).await?;

        let professionals = match selector {
            ProfessionalSelector::Any => eligible,
            ProfessionalSelector::Specific(id) => {
                let chosen: Vec<Professional> = eligible.into_iter().filter(|p| &p.id == id).collect();
                if chosen.is_empty() {
                    warn!("Professional {} is not eligible for service {} at branch {}", id, service.id, branch.id);
                    return Err(AppError::Configuration(format!(
                        "professional {} does not offer this service at this branch", id
                    )));
                }
                chosen
            }
        };

        Ok(Offering { service, branch, professionals })
    }

    async fn active_service(&self, tenant: &Tenant, service_id: &str) -> Result<Service, AppError> {
        let service = self.catalog_repo.find_service(&tenant.id, service_id).await?
            .ok_or(AppError::NotFound("Service not found".into()))?;
        if !service.active {
            return Err(AppError::Configuration(format!("service {} is not active", service.id)));
        }
        if service.session_duration_min <= 0 {
            return Err(AppError::Configuration(format!("service {} has no session duration", service.id)));
        }
        Ok(service)
    }

    /// Without an explicit branch the tenant default is used when it offers
    /// the service, else the only offering branch.
    async fn offered_branch(&self, tenant: &Tenant, service: &Service, branch_id: Option<&str>) -> Result<Branch, AppError> {
        let mut offered = self.catalog_repo.list_branches_for_service(&tenant.id, &service.id).await?;

        match branch_id.filter(|id| !id.is_empty()) {
            Some(id) => {
                if let Some(branch) = offered.into_iter().find(|b| b.id == id) {
                    return Ok(branch);
                }
                match self.catalog_repo.find_branch(&tenant.id, id).await? {
                    Some(_) => Err(AppError::Configuration(format!("service {} is not offered at branch {}", service.id, id))),
                    None => Err(AppError::NotFound("Branch not found".into())),
                }
            }
            None => {
                if let Some(default) = offered.iter().find(|b| b.is_default) {
                    return Ok(default.clone());
                }
                match offered.len() {
                    1 => Ok(offered.remove(0)),
                    0 => Err(AppError::Configuration(format!("service {} is not offered at any branch", service.id))),
                    _ => Err(AppError::Configuration("a branch must be selected for this service".into())),
                }
            }
        }
    }
}
