//! Application state shared by all handlers.

use shule_core::Config;
use shule_db::{
    AcademicsRepository, ApplicationRepository, EnrollmentService, SchoolRepository,
    StudentRepository, TemplateRepository, UserRepository,
};
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub users: UserRepository,
    pub schools: SchoolRepository,
    pub applications: ApplicationRepository,
    pub students: StudentRepository,
    pub academics: AcademicsRepository,
    pub templates: TemplateRepository,
    pub enrollment: EnrollmentService,
}

impl AppState {
    pub fn new(config: Config, pool: PgPool) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            schools: SchoolRepository::new(pool.clone()),
            applications: ApplicationRepository::new(pool.clone()),
            students: StudentRepository::new(pool.clone()),
            academics: AcademicsRepository::new(pool.clone()),
            templates: TemplateRepository::new(pool.clone()),
            enrollment: EnrollmentService::new(pool.clone()),
            pool,
            config,
        }
    }
}
