//! The `paes init` command.

use std::path::Path;

use anyhow::{Context, Result};

pub fn execute() -> Result<()> {
    let files = [
        ("paes.toml", SAMPLE_CONFIG),
        ("exams/example.toml", EXAMPLE_EXAM),
        ("sessions/example.json", EXAMPLE_SESSION),
        // Seed the file store so `paes finish` has something to work on.
        ("paes-data/exams/example.toml", EXAMPLE_EXAM),
        ("paes-data/sessions/example-session.json", EXAMPLE_SESSION),
    ];

    for (path, content) in files {
        write_if_missing(Path::new(path), content)?;
    }

    println!("\nNext steps:");
    println!("  1. Run: paes validate --exam exams/example.toml");
    println!("  2. Run: paes score --exam exams/example.toml --session sessions/example.json --format all");
    println!("  3. Run: paes finish --session-id example-session");

    Ok(())
}

fn write_if_missing(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        println!("{} already exists, skipping.", path.display());
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!("Created {}", path.display());
    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# paes configuration

parallelism = 4
exam_cache_ttl_secs = 300
output_dir = "./paes-results"

[store]
type = "file"
data_dir = "./paes-data"

[scoring]
weak_threshold = 60
critical_threshold = 40
rush_factor = 0.5
slow_factor = 2.0
"#;

const EXAMPLE_EXAM: &str = r#"[exam]
id = "example"
title = "Ensayo de ejemplo"
description = "Un ensayo corto con preguntas de todas las pruebas"
time_limit_minutes = 30

[[questions]]
id = "cl-01"
question = "Según el texto, ¿dónde ocurre la historia?"
options = ["En la playa", "En el campo", "En la ciudad", "En la montaña"]
correct_answer = 2
subject = "COMPETENCIA_LECTORA"
skill = "TRACK_LOCATE"
difficulty = "BASIC"

[[questions]]
id = "cl-02"
question = "¿Qué relación existe entre el primer y el segundo párrafo?"
options = ["Causa y efecto", "Problema y solución", "Comparación", "Secuencia"]
correct_answer = 0
subject = "COMPETENCIA_LECTORA"
skill = "INTERPRET_RELATE"
difficulty = "INTERMEDIATE"

[[questions]]
id = "m1-01"
question = "¿Cuánto es 3 × 4?"
options = ["7", "12", "34", "1"]
correct_answer = 1
subject = "MATEMATICA_M1"
skill = "SOLVE_PROBLEMS"
difficulty = "BASIC"
explanation = "3 × 4 = 12"

[[questions]]
id = "m1-02"
question = "¿Qué expresiones son equivalentes a 2(x + 1)?"
options = ["2x + 2", "2x + 1", "x + 1 + x + 1", "2x"]
correct_answer = [0, 2]
subject = "MATEMATICA_M1"
skill = "MODEL"
difficulty = "ADVANCED"

[[questions]]
id = "hi-01"
question = "¿En qué año se firmó el Acta de Independencia de Chile?"
options = ["1810", "1814", "1817", "1818"]
correct_answer = 3
subject = "HISTORIA"
skill = "EVALUATE_REFLECT"
difficulty = "INTERMEDIATE"
explanation = "El Acta de Independencia se firmó en 1818."

[[questions]]
id = "ci-01"
question = "¿Cuál es la unidad de fuerza en el Sistema Internacional?"
options = ["Joule", "Newton", "Watt", "Pascal"]
correct_answer = 1
subject = "CIENCIAS"
skill = "ARGUE_COMMUNICATE"
difficulty = "ADVANCED"
"#;

const EXAMPLE_SESSION: &str = r#"{
  "id": "example-session",
  "examId": "example",
  "userId": "demo-user",
  "startedAt": "2025-04-01T09:00:00Z",
  "status": "IN_PROGRESS",
  "currentQuestionIndex": 5,
  "answers": [
    { "questionId": "cl-01", "selectedAnswer": 2, "timeSpent": 45, "timestamp": "2025-04-01T09:00:45Z" },
    { "questionId": "cl-02", "selectedAnswer": 1, "timeSpent": 50, "timestamp": "2025-04-01T09:01:35Z" },
    { "questionId": "m1-01", "selectedAnswer": 1, "timeSpent": 40, "timestamp": "2025-04-01T09:02:15Z" },
    { "questionId": "m1-02", "selectedAnswer": [2, 0], "timeSpent": 60, "timestamp": "2025-04-01T09:03:15Z" },
    { "questionId": "hi-01", "selectedAnswer": null, "timeSpent": 5, "timestamp": "2025-04-01T09:03:20Z", "markedForReview": true },
    { "questionId": "ci-01", "selectedAnswer": 0, "timeSpent": 200, "timestamp": "2025-04-01T09:06:40Z" }
  ]
}
"#;
