use crate::access::{self, Action};
use crate::calc::LetterGrade;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use serde_json::{json, Map, Value};

#[derive(Clone, Copy)]
pub enum SetupSection {
    Institution,
    Catalog,
    GradeScale,
}

impl SetupSection {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "institution" => Some(SetupSection::Institution),
            "catalog" => Some(SetupSection::Catalog),
            "gradeScale" => Some(SetupSection::GradeScale),
            _ => None,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            SetupSection::Institution => "institution",
            SetupSection::Catalog => "catalog",
            SetupSection::GradeScale => "gradeScale",
        }
    }
}

fn default_section(section: SetupSection) -> Value {
    match section {
        SetupSection::Institution => json!({
            "name": "NSBM Green University",
            "tagline": "Student Records ERP System",
            "registrar": "Registrar's Office"
        }),
        SetupSection::Catalog => json!({
            "currentSemester": "Fall 2024",
            "semesters": ["Fall 2024", "Spring 2024", "Fall 2023"],
            "programs": [
                "Computer Science",
                "Business Administration",
                "Engineering",
                "Psychology",
                "Medicine"
            ],
            "academicYears": ["1st Year", "2nd Year", "3rd Year", "4th Year", "Graduate"]
        }),
        SetupSection::GradeScale => {
            let scale: Vec<Value> = LetterGrade::ALL
                .iter()
                .map(|g| json!({ "letter": g.as_str(), "points": g.points() }))
                .collect();
            json!({ "scale": scale })
        }
    }
}

fn parse_string_max(v: &Value, key: &str, max: usize) -> Result<String, String> {
    let Some(s) = v.as_str() else {
        return Err(format!("{} must be a string", key));
    };
    let t = s.trim();
    if t.is_empty() {
        return Err(format!("{} must not be empty", key));
    }
    if t.len() > max {
        return Err(format!("{} too long (max {} chars)", key, max));
    }
    Ok(t.to_string())
}

fn parse_string_list(
    v: &Value,
    key: &str,
    max_items: usize,
    max_len: usize,
) -> Result<Vec<String>, String> {
    let Some(items) = v.as_array() else {
        return Err(format!("{} must be an array of strings", key));
    };
    if items.is_empty() {
        return Err(format!("{} must not be empty", key));
    }
    if items.len() > max_items {
        return Err(format!("{} too long (max {} items)", key, max_items));
    }
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        out.push(parse_string_max(item, key, max_len)?);
    }
    Ok(out)
}

fn merge_section_patch(
    section: SetupSection,
    current: &mut Value,
    patch: &Map<String, Value>,
) -> Result<(), String> {
    if patch.is_empty() {
        return Err("patch must include at least one field".into());
    }
    let Some(obj) = current.as_object_mut() else {
        return Err("section must be an object".into());
    };
    for (k, v) in patch {
        match section {
            SetupSection::Institution => match k.as_str() {
                "name" => {
                    obj.insert(k.clone(), Value::String(parse_string_max(v, k, 120)?));
                }
                "tagline" => {
                    obj.insert(k.clone(), Value::String(parse_string_max(v, k, 200)?));
                }
                "registrar" => {
                    obj.insert(k.clone(), Value::String(parse_string_max(v, k, 120)?));
                }
                _ => return Err(format!("unknown institution field: {}", k)),
            },
            SetupSection::Catalog => match k.as_str() {
                "currentSemester" => {
                    obj.insert(k.clone(), Value::String(parse_string_max(v, k, 40)?));
                }
                "semesters" => {
                    let list = parse_string_list(v, k, 24, 40)?;
                    obj.insert(k.clone(), Value::from(list));
                }
                "programs" => {
                    let list = parse_string_list(v, k, 40, 80)?;
                    obj.insert(k.clone(), Value::from(list));
                }
                "academicYears" => {
                    let list = parse_string_list(v, k, 12, 40)?;
                    obj.insert(k.clone(), Value::from(list));
                }
                _ => return Err(format!("unknown catalog field: {}", k)),
            },
            // The point table is fixed; edits would silently reprice GPAs.
            SetupSection::GradeScale => return Err("gradeScale is read-only".into()),
        }
    }
    Ok(())
}

/// Current value of a section: the defaults with any stored overrides
/// applied on top. Malformed stored values are skipped, not fatal.
pub fn effective_section(state: &AppState, section: SetupSection) -> Value {
    let mut current = default_section(section);
    if let Some(saved) = state.settings.get(section.key()) {
        if let Some(saved_obj) = saved.as_object() {
            let _ = merge_section_patch(section, &mut current, saved_obj);
        }
    }
    current
}

pub fn current_semester(state: &AppState) -> String {
    effective_section(state, SetupSection::Catalog)
        .get("currentSemester")
        .and_then(|v| v.as_str())
        .unwrap_or("Fall 2024")
        .to_string()
}

fn handle_setup_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    if state.session.account().is_none() {
        return err(&req.id, "not_signed_in", "sign in first", None);
    }
    let institution = effective_section(state, SetupSection::Institution);
    let catalog = effective_section(state, SetupSection::Catalog);
    let grade_scale = effective_section(state, SetupSection::GradeScale);

    ok(
        &req.id,
        json!({
            "institution": institution,
            "catalog": catalog,
            "gradeScale": grade_scale
        }),
    )
}

fn handle_setup_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(account) = state.session.account() else {
        return err(&req.id, "not_signed_in", "sign in first", None);
    };
    let role = account.role;
    if !access::can_perform(role, Action::EditSetup) {
        return err(
            &req.id,
            "forbidden",
            format!("{} may not edit setup", role.as_str()),
            None,
        );
    }
    let Some(section_raw) = req.params.get("section").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing section", None);
    };
    let Some(section) = SetupSection::parse(section_raw) else {
        return err(&req.id, "bad_params", "unknown section", None);
    };
    let Some(patch_obj) = req.params.get("patch").and_then(|v| v.as_object()) else {
        return err(&req.id, "bad_params", "patch must be an object", None);
    };

    let mut current = effective_section(state, section);
    if let Err(msg) = merge_section_patch(section, &mut current, patch_obj) {
        return err(&req.id, "bad_params", msg, None);
    }
    state
        .settings
        .insert(section.key().to_string(), current);
    ok(&req.id, json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "setup.get" => Some(handle_setup_get(state, req)),
        "setup.update" => Some(handle_setup_update(state, req)),
        _ => None,
    }
}
