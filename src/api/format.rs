//! Row models to wire JSON. Clients see camelCase keys and a stable key
//! set: optional columns serialize as explicit nulls, timestamps as RFC
//! 3339 with millisecond precision in UTC.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Map, Value};

use crate::database::models::{AiInsight, FamilyMember, Report, User, Vitals};
use crate::database::repository::family_members::MemberRef;

/// The public slice of a user record, as returned by register/login/me.
pub fn user_public(user: &User) -> Value {
    json!({
        "id": user.id,
        "name": user.name,
        "email": user.email,
    })
}

pub fn family_member(member: &FamilyMember) -> Value {
    let mut obj = Map::new();
    obj.insert("id".into(), json!(member.id));
    obj.insert("userId".into(), json!(member.user_id));
    obj.insert("name".into(), json!(member.name));
    obj.insert("relation".into(), json!(member.relation));
    obj.insert("color".into(), json!(member.color));
    obj.insert("customId".into(), opt_text(member.custom_id.as_deref()));
    obj.insert(
        "dateOfBirth".into(),
        opt_timestamp(member.date_of_birth.as_ref()),
    );
    obj.insert("bloodGroup".into(), opt_text(member.blood_group.as_deref()));
    obj.insert("allergies".into(), opt_text(member.allergies.as_deref()));
    obj.insert(
        "medicalConditions".into(),
        opt_text(member.medical_conditions.as_deref()),
    );
    obj.insert("createdAt".into(), timestamp(&member.created_at));
    obj.insert("updatedAt".into(), timestamp(&member.updated_at));
    Value::Object(obj)
}

/// Detail view: the member plus their report count and most recent vitals.
pub fn family_member_detail(
    member: &FamilyMember,
    reports_count: i64,
    recent_vitals: &[Vitals],
) -> Value {
    let mut obj = match family_member(member) {
        Value::Object(obj) => obj,
        _ => Map::new(),
    };
    obj.insert("reportsCount".into(), json!(reports_count));
    obj.insert(
        "recentVitals".into(),
        Value::Array(recent_vitals.iter().map(vitals_plain).collect()),
    );
    Value::Object(obj)
}

pub fn member_ref(member: &MemberRef) -> Value {
    json!({
        "id": member.id,
        "name": member.name,
        "relation": member.relation,
        "color": member.color,
    })
}

/// List/detail form of a report: the linked member expanded to a slim
/// object and the AI insight attached (or null).
pub fn report(entry: &Report, member: Option<&MemberRef>, insight: Option<&AiInsight>) -> Value {
    let mut obj = report_fields(entry);
    obj.insert(
        "familyMemberId".into(),
        member.map(member_ref).unwrap_or(Value::Null),
    );
    obj.insert(
        "aiInsight".into(),
        insight.map(ai_insight).unwrap_or(Value::Null),
    );
    Value::Object(obj)
}

/// Create-response form of a report: the member link stays a bare id.
pub fn report_plain(entry: &Report) -> Value {
    let mut obj = report_fields(entry);
    obj.insert(
        "familyMemberId".into(),
        entry.family_member_id.map(|id| json!(id)).unwrap_or(Value::Null),
    );
    Value::Object(obj)
}

fn report_fields(entry: &Report) -> Map<String, Value> {
    let mut obj = Map::new();
    obj.insert("id".into(), json!(entry.id));
    obj.insert("userId".into(), json!(entry.user_id));
    obj.insert("fileName".into(), json!(entry.file_name));
    obj.insert("fileType".into(), json!(entry.file_type));
    obj.insert("fileUrl".into(), json!(entry.file_url));
    obj.insert(
        "storagePublicId".into(),
        opt_text(entry.storage_public_id.as_deref()),
    );
    obj.insert("uploadDate".into(), timestamp(&entry.upload_date));
    obj.insert("testDate".into(), timestamp(&entry.test_date));
    obj.insert("labHospital".into(), opt_text(entry.lab_hospital.as_deref()));
    obj.insert("doctor".into(), opt_text(entry.doctor.as_deref()));
    obj.insert("price".into(), opt_text(entry.price.as_deref()));
    obj.insert("notes".into(), opt_text(entry.notes.as_deref()));
    obj.insert("createdAt".into(), timestamp(&entry.created_at));
    obj.insert("updatedAt".into(), timestamp(&entry.updated_at));
    obj
}

/// List form of a vitals entry, with the member link expanded.
pub fn vitals(entry: &Vitals, member: Option<&MemberRef>) -> Value {
    let mut obj = vitals_fields(entry);
    obj.insert(
        "familyMemberId".into(),
        member.map(member_ref).unwrap_or(Value::Null),
    );
    Value::Object(obj)
}

/// Create/update-response form of a vitals entry: bare member id.
pub fn vitals_plain(entry: &Vitals) -> Value {
    let mut obj = vitals_fields(entry);
    obj.insert(
        "familyMemberId".into(),
        entry.family_member_id.map(|id| json!(id)).unwrap_or(Value::Null),
    );
    Value::Object(obj)
}

fn vitals_fields(entry: &Vitals) -> Map<String, Value> {
    let mut obj = Map::new();
    obj.insert("id".into(), json!(entry.id));
    obj.insert("userId".into(), json!(entry.user_id));
    obj.insert("date".into(), timestamp(&entry.date));
    obj.insert("bloodPressure".into(), blood_pressure(entry));
    obj.insert("bloodSugar".into(), opt_number(entry.blood_sugar));
    obj.insert("weight".into(), opt_number(entry.weight));
    obj.insert(
        "heartRate".into(),
        entry.heart_rate.map(|v| json!(v)).unwrap_or(Value::Null),
    );
    obj.insert("temperature".into(), opt_number(entry.temperature));
    obj.insert(
        "oxygenLevel".into(),
        entry.oxygen_level.map(|v| json!(v)).unwrap_or(Value::Null),
    );
    obj.insert("notes".into(), opt_text(entry.notes.as_deref()));
    obj.insert("createdAt".into(), timestamp(&entry.created_at));
    obj.insert("updatedAt".into(), timestamp(&entry.updated_at));
    obj
}

pub fn ai_insight(insight: &AiInsight) -> Value {
    let mut obj = Map::new();
    obj.insert("id".into(), json!(insight.id));
    obj.insert("fileId".into(), json!(insight.file_id));
    obj.insert("userId".into(), json!(insight.user_id));
    obj.insert("summaryEnglish".into(), json!(insight.summary_english));
    obj.insert("summaryUrdu".into(), json!(insight.summary_urdu));
    obj.insert("abnormalValues".into(), insight.abnormal_values.clone());
    obj.insert("questionsToAsk".into(), insight.questions_to_ask.clone());
    obj.insert(
        "foodRecommendations".into(),
        insight.food_recommendations.clone(),
    );
    obj.insert("homeRemedies".into(), insight.home_remedies.clone());
    obj.insert("disclaimer".into(), json!(insight.disclaimer));
    obj.insert("createdAt".into(), timestamp(&insight.created_at));
    obj.insert("updatedAt".into(), timestamp(&insight.updated_at));
    Value::Object(obj)
}

/// Blood pressure is stored flat but travels nested. Absent on both
/// sides means null, otherwise only the recorded side appears.
fn blood_pressure(entry: &Vitals) -> Value {
    if entry.systolic.is_none() && entry.diastolic.is_none() {
        return Value::Null;
    }
    let mut bp = Map::new();
    if let Some(systolic) = entry.systolic {
        bp.insert("systolic".into(), json!(systolic));
    }
    if let Some(diastolic) = entry.diastolic {
        bp.insert("diastolic".into(), json!(diastolic));
    }
    Value::Object(bp)
}

fn timestamp(dt: &DateTime<Utc>) -> Value {
    Value::String(dt.to_rfc3339_opts(SecondsFormat::Millis, true))
}

fn opt_timestamp(dt: Option<&DateTime<Utc>>) -> Value {
    dt.map(timestamp).unwrap_or(Value::Null)
}

fn opt_text(text: Option<&str>) -> Value {
    text.map(|t| Value::String(t.to_string())).unwrap_or(Value::Null)
}

fn opt_number(value: Option<f64>) -> Value {
    value.map(|v| json!(v)).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 8, 30, 0).unwrap()
    }

    fn member() -> FamilyMember {
        FamilyMember {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "Ayesha".into(),
            relation: "Mother".into(),
            color: "#ec4899".into(),
            custom_id: None,
            date_of_birth: None,
            blood_group: Some("O+".into()),
            allergies: None,
            medical_conditions: None,
            created_at: ts(),
            updated_at: ts(),
        }
    }

    fn vitals_row(systolic: Option<i32>, diastolic: Option<i32>) -> Vitals {
        Vitals {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            family_member_id: None,
            date: ts(),
            systolic,
            diastolic,
            blood_sugar: None,
            weight: Some(72.5),
            heart_rate: None,
            temperature: None,
            oxygen_level: None,
            notes: None,
            created_at: ts(),
            updated_at: ts(),
        }
    }

    fn report_row() -> Report {
        Report {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            family_member_id: None,
            file_name: "cbc.pdf".into(),
            file_type: "CBC".into(),
            file_url: "https://cdn.invalid/cbc.pdf".into(),
            storage_public_id: Some("healthmate/reports/cbc".into()),
            upload_date: ts(),
            test_date: ts(),
            lab_hospital: None,
            doctor: Some("Dr. Khan".into()),
            price: None,
            notes: None,
            created_at: ts(),
            updated_at: ts(),
        }
    }

    #[test]
    fn member_keys_are_camel_case_with_null_optionals() {
        let value = family_member(&member());
        assert_eq!(value["relation"], "Mother");
        assert_eq!(value["bloodGroup"], "O+");
        assert_eq!(value["customId"], Value::Null);
        assert_eq!(value["dateOfBirth"], Value::Null);
        assert_eq!(value["createdAt"], "2024-03-01T08:30:00.000Z");
        assert!(value.get("custom_id").is_none());
    }

    #[test]
    fn detail_view_appends_count_and_recent_vitals() {
        let rows = vec![vitals_row(Some(120), Some(80))];
        let value = family_member_detail(&member(), 3, &rows);
        assert_eq!(value["reportsCount"], 3);
        assert_eq!(value["recentVitals"].as_array().unwrap().len(), 1);
        assert_eq!(value["recentVitals"][0]["bloodPressure"]["systolic"], 120);
    }

    #[test]
    fn report_expands_member_and_insight() {
        let linked = MemberRef {
            id: Uuid::new_v4(),
            name: "Ayesha".into(),
            relation: "Mother".into(),
            color: "#ec4899".into(),
        };
        let value = report(&report_row(), Some(&linked), None);
        assert_eq!(value["familyMemberId"]["name"], "Ayesha");
        assert_eq!(value["aiInsight"], Value::Null);
        assert_eq!(value["fileType"], "CBC");
        assert_eq!(value["doctor"], "Dr. Khan");
    }

    #[test]
    fn plain_report_keeps_the_bare_member_id() {
        let mut row = report_row();
        let id = Uuid::new_v4();
        row.family_member_id = Some(id);
        let value = report_plain(&row);
        assert_eq!(value["familyMemberId"], json!(id));
    }

    #[test]
    fn blood_pressure_nests_only_recorded_sides() {
        let both = vitals_plain(&vitals_row(Some(120), Some(80)));
        assert_eq!(both["bloodPressure"]["systolic"], 120);
        assert_eq!(both["bloodPressure"]["diastolic"], 80);

        let one = vitals_plain(&vitals_row(Some(130), None));
        assert_eq!(one["bloodPressure"]["systolic"], 130);
        assert!(one["bloodPressure"].get("diastolic").is_none());

        let none = vitals_plain(&vitals_row(None, None));
        assert_eq!(none["bloodPressure"], Value::Null);
        assert_eq!(none["weight"], 72.5);
    }

    #[test]
    fn user_public_exposes_three_fields_only() {
        let user = User {
            id: Uuid::new_v4(),
            email: "sana@example.com".into(),
            password_hash: "$2b$10$secret".into(),
            name: "Sana".into(),
            created_at: ts(),
            updated_at: ts(),
        };
        let value = user_public(&user);
        assert_eq!(value.as_object().unwrap().len(), 3);
        assert!(value.get("password_hash").is_none());
        assert!(value.get("passwordHash").is_none());
    }
}
