//! Class names in model output order

use cropcheck_core::{Error, Result};
use std::path::Path;

/// The 38 PlantVillage classes, spelled exactly as the model was trained
pub const PLANT_VILLAGE_CLASSES: [&str; 38] = [
    "Apple___Apple_scab",
    "Apple___Black_rot",
    "Apple___Cedar_apple_rust",
    "Apple___healthy",
    "Blueberry___healthy",
    "Cherry_(including_sour)___Powdery_mildew",
    "Cherry_(including_sour)___healthy",
    "Corn_(maize)___Cercospora_leaf_spot Gray_leaf_spot",
    "Corn_(maize)___Common_rust_",
    "Corn_(maize)___Northern_Leaf_Blight",
    "Corn_(maize)___healthy",
    "Grape___Black_rot",
    "Grape___Esca_(Black_Measles)",
    "Grape___Leaf_blight_(Isariopsis_Leaf_Spot)",
    "Grape___healthy",
    "Orange___Haunglongbing_(Citrus_greening)",
    "Peach___Bacterial_spot",
    "Peach___healthy",
    "Pepper,_bell___Bacterial_spot",
    "Pepper,_bell___healthy",
    "Potato___Early_blight",
    "Potato___Late_blight",
    "Potato___healthy",
    "Raspberry___healthy",
    "Soybean___healthy",
    "Squash___Powdery_mildew",
    "Strawberry___Leaf_scorch",
    "Strawberry___healthy",
    "Tomato___Bacterial_spot",
    "Tomato___Early_blight",
    "Tomato___Late_blight",
    "Tomato___Leaf_Mold",
    "Tomato___Septoria_leaf_spot",
    "Tomato___Spider_mites Two-spotted_spider_mite",
    "Tomato___Target_Spot",
    "Tomato___Tomato_Yellow_Leaf_Curl_Virus",
    "Tomato___Tomato_mosaic_virus",
    "Tomato___healthy",
];

/// Owned copy of [`PLANT_VILLAGE_CLASSES`]
pub fn plant_village_classes() -> Vec<String> {
    PLANT_VILLAGE_CLASSES.iter().map(|c| c.to_string()).collect()
}

/// Load class names from a JSON or YAML list.
///
/// Order matters: entry `i` names output `i` of the model.
pub fn load_class_names(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;

    // YAML is a superset of JSON, so one parser covers both
    let names: Vec<String> = serde_yaml::from_str(&content).map_err(|e| {
        Error::config(format!("Invalid class name list {}: {}", path.display(), e))
    })?;

    if names.is_empty() {
        return Err(Error::config(format!(
            "Class name list {} is empty",
            path.display()
        )));
    }

    if let Some(blank) = names.iter().position(|n| n.trim().is_empty()) {
        return Err(Error::config(format!(
            "Class name list {} has a blank entry at index {}",
            path.display(),
            blank
        )));
    }

    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_plant_village_classes() {
        let classes = plant_village_classes();
        assert_eq!(classes.len(), 38);
        assert_eq!(classes[0], "Apple___Apple_scab");
        assert_eq!(classes[37], "Tomato___healthy");
    }

    #[test]
    fn test_load_json_list() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"["Potato___Early_blight", "Potato___healthy"]"#).unwrap();

        let names = load_class_names(file.path()).unwrap();
        assert_eq!(names, vec!["Potato___Early_blight", "Potato___healthy"]);
    }

    #[test]
    fn test_load_yaml_list() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "- Rice___Blast\n- Rice___healthy").unwrap();

        let names = load_class_names(file.path()).unwrap();
        assert_eq!(names.len(), 2);
    }

    #[test]
    fn test_load_rejects_empty_and_blank() {
        let mut empty = tempfile::NamedTempFile::new().unwrap();
        write!(empty, "[]").unwrap();
        assert!(matches!(load_class_names(empty.path()), Err(Error::Config(_))));

        let mut blank = tempfile::NamedTempFile::new().unwrap();
        write!(blank, r#"["Apple___healthy", "  "]"#).unwrap();
        assert!(matches!(load_class_names(blank.path()), Err(Error::Config(_))));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            load_class_names("/no/such/classes.json"),
            Err(Error::Io(_))
        ));
    }
}
