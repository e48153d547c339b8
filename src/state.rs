use std::sync::Arc;
use crate::config::Config;
use crate::domain::ports::{BookingRepository, CatalogRepository, PaymentProvider, PaymentRepository, TenantRepository};
use crate::domain::services::{
    availability::AvailabilityService, catalog::CatalogService, deposit::DepositService,
    query::BookingQueryService, reservation::ReservationService,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub tenant_repo: Arc<dyn TenantRepository>,
    pub catalog_repo: Arc<dyn CatalogRepository>,
    pub booking_repo: Arc<dyn BookingRepository>,
    pub payment_repo: Arc<dyn PaymentRepository>,
    pub payment_provider: Arc<dyn PaymentProvider>,
    pub catalog: Arc<CatalogService>,
    pub availability: Arc<AvailabilityService>,
    pub reservations: Arc<ReservationService>,
    pub deposits: Arc<DepositService>,
    pub queries: Arc<BookingQueryService>,
}

impl AppState {
    pub fn new(
        config: Config,
        tenant_repo: Arc<dyn TenantRepository>,
        catalog_repo: Arc<dyn CatalogRepository>,
        booking_repo: Arc<dyn BookingRepository>,
        payment_repo: Arc<dyn PaymentRepository>,
        payment_provider: Arc<dyn PaymentProvider>,
    ) -> Self {
        let catalog = Arc::new(CatalogService::new(tenant_repo.clone(), catalog_repo.clone()));
        let availability = Arc::new(AvailabilityService::new(catalog.clone(), catalog_repo.clone(), booking_repo.clone()));
        let reservations = Arc::new(ReservationService::new(catalog.clone(), availability.clone(), booking_repo.clone()));
        let deposits = Arc::new(DepositService::new(
            booking_repo.clone(),
            payment_repo.clone(),
            payment_provider.clone(),
            config.payment_notification_url.clone(),
            config.public_base_url.clone(),
        ));
        let queries = Arc::new(BookingQueryService::new(booking_repo.clone(), payment_repo.clone(), deposits.clone()));

        Self {
            config,
            tenant_repo,
            catalog_repo,
            booking_repo,
            payment_repo,
            payment_provider,
            catalog,
            availability,
            reservations,
            deposits,
            queries,
        }
    }
}
