use alloctrack_config::Settings;
use alloctrack_services::{
    AuthService, NotificationService, WorkflowService,
    dao::{
        category::CategoryDao, consortium::ConsortiumDao, notification::NotificationDao,
        project::ProjectDao, resource::ResourceDao, service::ServiceDao, user::UserDao,
    },
    workflow::WorkflowSettings,
};
use mongodb::Database;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub settings: Settings,
    pub auth: Arc<AuthService>,
    pub users: Arc<UserDao>,
    pub resources: Arc<ResourceDao>,
    pub categories: Arc<CategoryDao>,
    pub consortia: Arc<ConsortiumDao>,
    pub projects: Arc<ProjectDao>,
    pub services: Arc<ServiceDao>,
    pub notifications: Arc<NotificationDao>,
    pub workflow: Arc<WorkflowService>,
}

impl AppState {
    pub fn new(db: Database, settings: Settings) -> Self {
        let auth = Arc::new(AuthService::new(settings.jwt.clone()));
        let users = Arc::new(UserDao::new(&db));
        let resources = Arc::new(ResourceDao::new(&db));
        let categories = Arc::new(CategoryDao::new(&db));
        let consortia = Arc::new(ConsortiumDao::new(&db));
        let projects = Arc::new(ProjectDao::new(&db));
        let services = Arc::new(ServiceDao::new(&db));
        let notifications = Arc::new(NotificationDao::new(&db));

        let notifier = Arc::new(NotificationService::new(
            &db,
            settings.notifications.enabled,
        ));
        let workflow = Arc::new(WorkflowService::new(
            &db,
            WorkflowSettings {
                invitation_ttl_days: settings.invitations.ttl_days,
            },
            notifier,
        ));

        Self {
            db,
            settings,
            auth,
            users,
            resources,
            categories,
            consortia,
            projects,
            services,
            notifications,
            workflow,
        }
    }
}
