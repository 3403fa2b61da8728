use clap::Subcommand;

use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::database::manager::DatabaseManager;

#[derive(Subcommand)]
pub enum InitCommands {
    #[command(about = "Create the database tables and indexes if missing")]
    Schema,
}

/// Idempotent DDL, executed in dependency order. Statements mirror the
/// row structs in `database::models`; `ai_insights.file_id` is unique
/// because re-analysis replaces the stored insight for a report.
const SCHEMA_STATEMENTS: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        name TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE TABLE IF NOT EXISTS family_members (
        id UUID PRIMARY KEY,
        user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        relation TEXT NOT NULL,
        color TEXT NOT NULL,
        custom_id TEXT,
        date_of_birth TIMESTAMPTZ,
        blood_group TEXT,
        allergies TEXT,
        medical_conditions TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE INDEX IF NOT EXISTS family_members_user_name_idx
        ON family_members (user_id, name)",
    "CREATE TABLE IF NOT EXISTS files (
        id UUID PRIMARY KEY,
        user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        family_member_id UUID REFERENCES family_members(id) ON DELETE SET NULL,
        file_name TEXT NOT NULL,
        file_type TEXT NOT NULL,
        file_url TEXT NOT NULL,
        storage_public_id TEXT,
        upload_date TIMESTAMPTZ NOT NULL DEFAULT now(),
        test_date TIMESTAMPTZ NOT NULL,
        lab_hospital TEXT,
        doctor TEXT,
        price TEXT,
        notes TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE INDEX IF NOT EXISTS files_user_test_date_idx
        ON files (user_id, test_date DESC)",
    "CREATE INDEX IF NOT EXISTS files_member_test_date_idx
        ON files (family_member_id, test_date DESC)",
    "CREATE INDEX IF NOT EXISTS files_user_file_type_idx
        ON files (user_id, file_type)",
    "CREATE TABLE IF NOT EXISTS vitals (
        id UUID PRIMARY KEY,
        user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        family_member_id UUID REFERENCES family_members(id) ON DELETE SET NULL,
        date TIMESTAMPTZ NOT NULL,
        systolic INTEGER,
        diastolic INTEGER,
        blood_sugar DOUBLE PRECISION,
        weight DOUBLE PRECISION,
        heart_rate INTEGER,
        temperature DOUBLE PRECISION,
        oxygen_level INTEGER,
        notes TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE INDEX IF NOT EXISTS vitals_user_date_idx
        ON vitals (user_id, date DESC)",
    "CREATE INDEX IF NOT EXISTS vitals_member_date_idx
        ON vitals (family_member_id, date DESC)",
    "CREATE TABLE IF NOT EXISTS ai_insights (
        id UUID PRIMARY KEY,
        file_id UUID NOT NULL UNIQUE REFERENCES files(id) ON DELETE CASCADE,
        user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        summary_english TEXT NOT NULL,
        summary_urdu TEXT NOT NULL,
        abnormal_values JSONB NOT NULL DEFAULT '[]',
        questions_to_ask JSONB NOT NULL DEFAULT '[]',
        food_recommendations JSONB NOT NULL DEFAULT '{}',
        home_remedies JSONB NOT NULL DEFAULT '[]',
        disclaimer TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE INDEX IF NOT EXISTS ai_insights_user_idx ON ai_insights (user_id)",
];

pub async fn handle(cmd: InitCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        InitCommands::Schema => {
            let pool = DatabaseManager::pool().await?;

            for statement in SCHEMA_STATEMENTS {
                sqlx::query(statement).execute(&pool).await?;
            }

            output_success(&output_format, "Database schema is up to date", None)
        }
    }
}
