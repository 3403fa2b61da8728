use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::FamilyMember;

const MEMBER_COLUMNS: &str = "id, user_id, name, relation, color, custom_id, date_of_birth, \
                              blood_group, allergies, medical_conditions, created_at, updated_at";

/// The slim projection embedded in report and vitals payloads.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MemberRef {
    pub id: Uuid,
    pub name: String,
    pub relation: String,
    pub color: String,
}

/// Fields for a new family member, already validated and canonicalized.
#[derive(Debug, Clone)]
pub struct NewFamilyMember {
    pub name: String,
    pub relation: String,
    pub color: String,
    pub custom_id: Option<String>,
    pub date_of_birth: Option<DateTime<Utc>>,
    pub blood_group: Option<String>,
    pub allergies: Option<String>,
    pub medical_conditions: Option<String>,
}

pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<FamilyMember>, DatabaseError> {
    let sql = format!(
        "SELECT {} FROM family_members WHERE user_id = $1 ORDER BY created_at DESC",
        MEMBER_COLUMNS
    );
    let members = sqlx::query_as::<_, FamilyMember>(&sql)
        .bind(user_id)
        .fetch_all(pool)
        .await?;
    Ok(members)
}

/// Fetch the slim projections for a set of member ids in one query.
pub async fn refs_for_user(
    pool: &PgPool,
    user_id: Uuid,
    ids: &[Uuid],
) -> Result<Vec<MemberRef>, DatabaseError> {
    if ids.is_empty() {
        return Ok(vec![]);
    }
    let refs = sqlx::query_as::<_, MemberRef>(
        "SELECT id, name, relation, color FROM family_members \
         WHERE user_id = $1 AND id = ANY($2)",
    )
    .bind(user_id)
    .bind(ids.to_vec())
    .fetch_all(pool)
    .await?;
    Ok(refs)
}

pub async fn get_for_user(
    pool: &PgPool,
    user_id: Uuid,
    id: Uuid,
) -> Result<Option<FamilyMember>, DatabaseError> {
    let sql = format!(
        "SELECT {} FROM family_members WHERE id = $1 AND user_id = $2",
        MEMBER_COLUMNS
    );
    let member = sqlx::query_as::<_, FamilyMember>(&sql)
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(member)
}

pub async fn create_for_user(
    pool: &PgPool,
    user_id: Uuid,
    new: NewFamilyMember,
) -> Result<FamilyMember, DatabaseError> {
    let now = Utc::now();
    let sql = format!(
        "INSERT INTO family_members
         (id, user_id, name, relation, color, custom_id, date_of_birth,
          blood_group, allergies, medical_conditions, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11)
         RETURNING {}",
        MEMBER_COLUMNS
    );
    let member = sqlx::query_as::<_, FamilyMember>(&sql)
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&new.name)
        .bind(&new.relation)
        .bind(&new.color)
        .bind(&new.custom_id)
        .bind(new.date_of_birth)
        .bind(&new.blood_group)
        .bind(&new.allergies)
        .bind(&new.medical_conditions)
        .bind(now)
        .fetch_one(pool)
        .await?;
    Ok(member)
}

/// Persist an already-merged member row. The WHERE clause re-checks ownership
/// so a row deleted or reassigned mid-flight updates nothing.
pub async fn update_row(
    pool: &PgPool,
    member: &FamilyMember,
) -> Result<Option<FamilyMember>, DatabaseError> {
    let sql = format!(
        "UPDATE family_members
         SET name = $1, relation = $2, color = $3, custom_id = $4, date_of_birth = $5,
             blood_group = $6, allergies = $7, medical_conditions = $8, updated_at = $9
         WHERE id = $10 AND user_id = $11
         RETURNING {}",
        MEMBER_COLUMNS
    );
    let updated = sqlx::query_as::<_, FamilyMember>(&sql)
        .bind(&member.name)
        .bind(&member.relation)
        .bind(&member.color)
        .bind(&member.custom_id)
        .bind(member.date_of_birth)
        .bind(&member.blood_group)
        .bind(&member.allergies)
        .bind(&member.medical_conditions)
        .bind(Utc::now())
        .bind(member.id)
        .bind(member.user_id)
        .fetch_optional(pool)
        .await?;
    Ok(updated)
}

/// Delete a member. Their reports and vitals are kept but unlinked first, so
/// nothing orphans and nothing cascades away.
pub async fn delete_for_user(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<bool, DatabaseError> {
    let mut tx = pool.begin().await?;

    sqlx::query("UPDATE files SET family_member_id = NULL WHERE family_member_id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("UPDATE vitals SET family_member_id = NULL WHERE family_member_id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    let result = sqlx::query("DELETE FROM family_members WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(result.rows_affected() > 0)
}
