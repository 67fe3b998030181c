//! Application state shared across handlers

use sqlx::PgPool;

use crate::{
    chat::ChatClient,
    middleware::JwtVerifier,
    repositories::{
        BookingRepository, CommunityRepository, EventRepository, NotificationRepository,
        ResourceRepository, StatsRepository, UserRepository,
    },
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub jwt_verifier: JwtVerifier,
    pub user_repository: UserRepository,
    pub event_repository: EventRepository,
    pub resource_repository: ResourceRepository,
    pub booking_repository: BookingRepository,
    pub community_repository: CommunityRepository,
    pub notification_repository: NotificationRepository,
    pub stats_repository: StatsRepository,
    pub chat_client: ChatClient,
}

impl AppState {
    /// Wire every repository to the same pool
    pub fn new(db_pool: PgPool, jwt_verifier: JwtVerifier, chat_client: ChatClient) -> Self {
        Self {
            user_repository: UserRepository::new(db_pool.clone()),
            event_repository: EventRepository::new(db_pool.clone()),
            resource_repository: ResourceRepository::new(db_pool.clone()),
            booking_repository: BookingRepository::new(db_pool.clone()),
            community_repository: CommunityRepository::new(db_pool.clone()),
            notification_repository: NotificationRepository::new(db_pool.clone()),
            stats_repository: StatsRepository::new(db_pool.clone()),
            db_pool,
            jwt_verifier,
            chat_client,
        }
    }
}
