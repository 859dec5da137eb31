use sqlx::{Executor, Sqlite};
use time::OffsetDateTime;

use super::record_id;
use crate::error::StoreError;
use crate::records::{Address, RecordId, User};

const COLLECTION: &str = "user";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: String,
    title: String,
    name: String,
    phone: String,
    email: String,
    password_hash: String,
    address: Option<String>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let title = row
            .title
            .parse()
            .map_err(|_| StoreError::corrupt(COLLECTION, format!("unknown title '{}'", row.title)))?;
        let address = row
            .address
            .map(|json| serde_json::from_str::<Address>(&json))
            .transpose()
            .map_err(|error| StoreError::corrupt(COLLECTION, error))?;

        Ok(User {
            id: record_id(COLLECTION, &row.id)?,
            title,
            name: row.name,
            phone: row.phone,
            email: row.email,
            password_hash: row.password_hash,
            address,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Insert a new user. Email and phone collide with every stored user.
pub async fn insert<'c, E>(executor: E, user: &User) -> Result<(), StoreError>
where
    E: Executor<'c, Database = Sqlite>,
{
    let address = user
        .address
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(|error| StoreError::corrupt(COLLECTION, error))?;

    sqlx::query(
        r#"
        INSERT INTO users (id, title, name, phone, email, password_hash, address, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(user.id.to_string())
    .bind(user.title.as_str())
    .bind(&user.name)
    .bind(&user.phone)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(address)
    .bind(user.created_at)
    .bind(user.updated_at)
    .execute(executor)
    .await
    .map_err(|error| {
        StoreError::from(error).naming(|field| match field {
            "email" => user.email.clone(),
            "phone" => user.phone.clone(),
            _ => user.id.to_string(),
        })
    })?;

    Ok(())
}

pub async fn find<'c, E>(executor: E, id: RecordId) -> Result<Option<User>, StoreError>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(executor)
        .await?
        .map(User::try_from)
        .transpose()
}

pub async fn find_by_email<'c, E>(executor: E, email: &str) -> Result<Option<User>, StoreError>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(executor)
        .await?
        .map(User::try_from)
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::Store;
    use crate::records::Salutation;
    use crate::repository::fixtures;

    #[tokio::test]
    async fn test_user_round_trips_with_address() {
        let store = Store::in_memory().await.unwrap();
        let mut user = fixtures::user("a@x.com", "9876543210");
        user.title = Salutation::Mrs;
        user.address = Some(Address {
            city: Some("Pune".to_string()),
            ..Address::default()
        });
        insert(store.pool(), &user).await.unwrap();

        let stored = find(store.pool(), user.id).await.unwrap().unwrap();
        assert_eq!(stored.title, Salutation::Mrs);
        assert_eq!(stored.password_hash, "hash");
        assert_eq!(stored.address, user.address);
        assert_eq!(
            find_by_email(store.pool(), "a@x.com").await.unwrap().unwrap().id,
            user.id
        );
        assert!(find_by_email(store.pool(), "b@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_user_email_and_phone_are_unique() {
        let store = Store::in_memory().await.unwrap();
        insert(store.pool(), &fixtures::user("a@x.com", "1234567890"))
            .await
            .unwrap();

        let same_email = insert(store.pool(), &fixtures::user("a@x.com", "9999999999")).await;
        assert!(matches!(
            same_email,
            Err(StoreError::Duplicate { field: "email", ref value, .. }) if value == "a@x.com"
        ));

        let same_phone = insert(store.pool(), &fixtures::user("b@x.com", "1234567890")).await;
        assert!(matches!(
            same_phone,
            Err(StoreError::Duplicate { field: "phone", ref value, .. }) if value == "1234567890"
        ));
    }
}
