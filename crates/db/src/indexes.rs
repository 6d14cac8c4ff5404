use mongodb::{Database, IndexModel, options::IndexOptions};
use tracing::info;

pub async fn ensure_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    // Users
    create_indexes(
        db,
        "users",
        vec![
            index_unique(bson::doc! { "email": 1 }),
            index_unique(bson::doc! { "username": 1 }),
        ],
    )
    .await?;

    // Resources
    create_indexes(db, "resources", vec![index_unique(bson::doc! { "name": 1 })]).await?;

    // Categories
    create_indexes(
        db,
        "categories",
        vec![index_unique(bson::doc! { "name": 1 })],
    )
    .await?;

    // Consortia
    create_indexes(
        db,
        "consortia",
        vec![
            index_unique(bson::doc! { "name": 1 }),
            index(bson::doc! { "manager_id": 1 }),
        ],
    )
    .await?;

    // Quotas
    create_indexes(
        db,
        "quotas",
        vec![index_unique(
            bson::doc! { "consortium_id": 1, "resource_id": 1 },
        )],
    )
    .await?;

    // Projects
    create_indexes(
        db,
        "projects",
        vec![
            index_unique(bson::doc! { "name": 1 }),
            index(bson::doc! { "consortium_id": 1 }),
        ],
    )
    .await?;

    // Collaborators
    create_indexes(
        db,
        "collaborators",
        vec![
            index_unique(bson::doc! { "project_id": 1, "user_id": 1 }),
            index(bson::doc! { "user_id": 1 }),
        ],
    )
    .await?;

    // Invitations
    create_indexes(
        db,
        "invitations",
        vec![
            index_unique(bson::doc! { "code": 1 }),
            index_unique(bson::doc! { "project_id": 1, "email": 1 }),
        ],
    )
    .await?;

    // Services
    create_indexes(
        db,
        "services",
        vec![
            index_unique(bson::doc! { "category_id": 1, "name": 1 }),
            index(bson::doc! { "project_id": 1 }),
        ],
    )
    .await?;

    // Requirements
    create_indexes(
        db,
        "requirements",
        vec![
            index(bson::doc! { "consortium_id": 1, "resource_id": 1, "status": 1 }),
            index(bson::doc! { "service_id": 1, "created_at": -1 }),
            index(bson::doc! { "project_id": 1 }),
        ],
    )
    .await?;

    // Comments
    create_indexes(
        db,
        "comments",
        vec![index(bson::doc! { "project_id": 1, "created_at": -1 })],
    )
    .await?;

    // Notifications
    create_indexes(
        db,
        "notifications",
        vec![
            index(bson::doc! { "email": 1, "is_read": 1, "created_at": -1 }),
            index(bson::doc! { "user_id": 1, "created_at": -1 }),
        ],
    )
    .await?;

    info!("All indexes ensured");
    Ok(())
}

fn index(keys: bson::Document) -> IndexModel {
    IndexModel::builder().keys(keys).build()
}

fn index_unique(keys: bson::Document) -> IndexModel {
    IndexModel::builder()
        .keys(keys)
        .options(IndexOptions::builder().unique(true).build())
        .build()
}

async fn create_indexes(
    db: &Database,
    collection: &str,
    indexes: Vec<IndexModel>,
) -> Result<(), mongodb::error::Error> {
    db.collection::<bson::Document>(collection)
        .create_indexes(indexes)
        .await?;
    info!(collection, "Indexes created");
    Ok(())
}
