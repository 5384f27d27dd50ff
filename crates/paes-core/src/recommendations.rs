//! Rule-based study recommendations.
//!
//! Recommendations are emitted in a fixed order: weak subjects, then weak
//! skills, then pacing. The list is neither sorted by priority nor
//! deduplicated; the dashboard renders it as-is.

use std::collections::BTreeMap;

use crate::engine::ScoringConfig;
use crate::model::{Skill, Subject};
use crate::results::{
    BucketScore, Priority, Recommendation, RecommendationType, SubjectScore, TimeAnalysis,
};

fn priority_for(percentage: u32, config: &ScoringConfig) -> Priority {
    if percentage < config.critical_threshold {
        Priority::High
    } else {
        Priority::Medium
    }
}

fn is_weak(total: u32, percentage: u32, config: &ScoringConfig) -> bool {
    total > 0 && percentage < config.weak_threshold
}

/// Build the recommendation list for a scored exam.
pub fn generate_recommendations(
    subject_scores: &BTreeMap<Subject, SubjectScore>,
    skill_scores: &BTreeMap<Skill, BucketScore>,
    time_analysis: &TimeAnalysis,
    config: &ScoringConfig,
) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();

    for (subject, score) in subject_scores {
        if is_weak(score.total, score.percentage, config) {
            let name = subject.display_name();
            recommendations.push(Recommendation {
                kind: RecommendationType::StudyMore,
                priority: priority_for(score.percentage, config),
                description: format!("Necesitas reforzar {name}"),
                action_items: vec![
                    format!("Revisar conceptos básicos de {name}"),
                    "Realizar ejercicios de práctica adicionales".to_string(),
                    "Consultar material de apoyo".to_string(),
                ],
            });
        }
    }

    for (skill, score) in skill_scores {
        if is_weak(score.total, score.percentage, config) {
            let name = skill.display_name();
            recommendations.push(Recommendation {
                kind: RecommendationType::PracticeSkill,
                priority: priority_for(score.percentage, config),
                description: format!("Mejorar habilidad: {name}"),
                action_items: vec![
                    format!("Practicar ejercicios específicos de {name}"),
                    "Estudiar técnicas y estrategias para esta habilidad".to_string(),
                ],
            });
        }
    }

    if !time_analysis.rush_periods.is_empty() {
        recommendations.push(Recommendation {
            kind: RecommendationType::TimeManagement,
            priority: Priority::Medium,
            description: "Mejora tu gestión del tiempo durante el examen".to_string(),
            action_items: vec![
                "Practica con cronómetro para mejorar tu ritmo".to_string(),
                "Lee cuidadosamente antes de responder".to_string(),
                "No te apresures en las primeras preguntas".to_string(),
            ],
        });
    }

    if !time_analysis.slow_periods.is_empty() {
        recommendations.push(Recommendation {
            kind: RecommendationType::TimeManagement,
            priority: Priority::Medium,
            description: "Optimiza tu velocidad de respuesta".to_string(),
            action_items: vec![
                "Practica técnicas de lectura rápida".to_string(),
                "Aprende a identificar respuestas obvias".to_string(),
                "No te detengas demasiado en preguntas difíciles".to_string(),
            ],
        });
    }

    recommendations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::Period;

    fn subject(score: u32, total: u32, percentage: u32) -> SubjectScore {
        SubjectScore {
            score,
            total,
            percentage,
            time_spent: 0,
        }
    }

    fn bucket(score: u32, total: u32, percentage: u32) -> BucketScore {
        BucketScore {
            score,
            total,
            percentage,
            average_time: 0,
        }
    }

    fn steady_pace() -> TimeAnalysis {
        TimeAnalysis {
            average_time_per_question: 10.0,
            time_distribution: vec![10, 10],
            rush_periods: vec![],
            slow_periods: vec![],
        }
    }

    #[test]
    fn weak_subjects_get_priority_by_threshold() {
        let subjects = BTreeMap::from([
            (Subject::CompetenciaLectora, subject(1, 4, 25)),
            (Subject::MatematicaM1, subject(1, 2, 50)),
            (Subject::Historia, subject(3, 4, 75)),
            (Subject::Ciencias, subject(0, 0, 0)),
        ]);
        let recs = generate_recommendations(
            &subjects,
            &BTreeMap::new(),
            &steady_pace(),
            &ScoringConfig::default(),
        );

        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].kind, RecommendationType::StudyMore);
        assert_eq!(recs[0].priority, Priority::High);
        assert_eq!(recs[0].description, "Necesitas reforzar Competencia Lectora");
        assert_eq!(recs[1].priority, Priority::Medium);
        assert!(recs[1].action_items[0].contains("Matemática M1"));
    }

    #[test]
    fn boundaries_are_strict() {
        let subjects = BTreeMap::from([
            (Subject::MatematicaM1, subject(3, 5, 60)),
            (Subject::MatematicaM2, subject(2, 5, 40)),
        ]);
        let recs = generate_recommendations(
            &subjects,
            &BTreeMap::new(),
            &steady_pace(),
            &ScoringConfig::default(),
        );
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].priority, Priority::Medium);
    }

    #[test]
    fn emission_order_is_subjects_skills_then_time() {
        let subjects = BTreeMap::from([(Subject::Ciencias, subject(0, 1, 0))]);
        let skills = BTreeMap::from([(Skill::Represent, bucket(1, 2, 50))]);
        let time = TimeAnalysis {
            average_time_per_question: 10.0,
            time_distribution: vec![1, 30, 1],
            rush_periods: vec![Period { start: 0, end: 0 }],
            slow_periods: vec![Period { start: 1, end: 1 }],
        };

        let recs = generate_recommendations(&subjects, &skills, &time, &ScoringConfig::default());
        let kinds: Vec<_> = recs.iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![
                RecommendationType::StudyMore,
                RecommendationType::PracticeSkill,
                RecommendationType::TimeManagement,
                RecommendationType::TimeManagement,
            ]
        );
        assert_eq!(recs[1].description, "Mejorar habilidad: Representar");
        assert_eq!(recs[2].description, "Mejora tu gestión del tiempo durante el examen");
        assert_eq!(recs[3].description, "Optimiza tu velocidad de respuesta");
    }

    #[test]
    fn custom_thresholds() {
        let config = ScoringConfig {
            weak_threshold: 80,
            critical_threshold: 70,
            ..ScoringConfig::default()
        };
        let subjects = BTreeMap::from([(Subject::Historia, subject(3, 4, 75))]);
        let recs = generate_recommendations(&subjects, &BTreeMap::new(), &steady_pace(), &config);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].priority, Priority::Medium);
    }
}
