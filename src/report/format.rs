//! Formatted terminal output.
//!
//! Formatting lives here so the training code stays free of presentation concerns.

use crate::models::ModelArtifact;
use crate::report::{WeightRankings, rank_weights};

/// Format the training summary (dataset, feature split, solver diagnostics, top weights).
pub fn format_training_summary(artifact: &ModelArtifact, top_n: usize) -> String {
    let s = &artifact.summary;
    let mut out = String::new();

    out.push_str("=== cdp - credit default model ===\n");
    out.push_str(&format!(
        "Version: {} (trained {})\n",
        artifact.version,
        artifact.trained_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    out.push_str(&format!(
        "Rows: n={} | defaults={} ({:.1}%) | from confirmed outcomes={}\n",
        s.rows,
        s.positives,
        100.0 * s.positives as f64 / s.rows.max(1) as f64,
        s.confirmed_rows,
    ));

    out.push_str("\nFeatures:\n");
    out.push_str(&format!("- numeric     ({:>2}): {}\n", s.split.numeric.len(), s.split.numeric.join(", ")));
    out.push_str(&format!(
        "- categorical ({:>2}): {}\n",
        s.split.categorical.len(),
        s.split.categorical.join(", ")
    ));
    out.push_str(&format!("- encoded width: {}\n", s.encoded_width));

    out.push_str("\nClassifier:\n");
    out.push_str(&format!(
        "- logistic regression, C={} | iterations={} | converged={}\n",
        artifact.pipeline.classifier.c, s.iterations, s.converged
    ));
    out.push_str(&format!("- intercept: {:.6}\n", artifact.pipeline.classifier.intercept));
    out.push_str(&format!(
        "- training log-loss={:.4} | accuracy={:.2}%\n",
        s.train_log_loss,
        100.0 * s.train_accuracy
    ));

    out.push('\n');
    out.push_str(&format_weights(&rank_weights(artifact, top_n)));
    out
}

/// Format the two coefficient tables.
pub fn format_weights(rankings: &WeightRankings) -> String {
    let mut out = String::new();

    out.push_str("Raises default risk:\n");
    out.push_str(&format_table(&rankings.riskier));
    out.push('\n');

    out.push_str("Lowers default risk:\n");
    out.push_str(&format_table(&rankings.safer));

    out
}

fn format_table(rows: &[(String, f64)]) -> String {
    let mut out = String::new();
    out.push_str(&format!("{:<28} {:>12}\n", "feature", "weight"));
    out.push_str(&format!("{:-<28} {:-<12}\n", "", ""));
    for (name, weight) in rows {
        out.push_str(&format!("{:<28} {:>12.6}\n", truncate(name, 28), weight));
    }
    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::generate_history;
    use crate::domain::TrainParams;
    use crate::fit::ModelTrainer;

    #[test]
    fn summary_lists_split_and_weights() {
        let dir = tempfile::TempDir::new().unwrap();
        let artifact = ModelTrainer::new(dir.path().join("m.json"), TrainParams::default())
            .fit(generate_history(300, 9).unwrap())
            .unwrap();

        let text = format_training_summary(&artifact, 5);
        assert!(text.contains("Rows: n=300"));
        assert!(text.contains("limit_bal"));
        assert!(text.contains("Raises default risk:"));
        assert!(text.contains("Lowers default risk:"));
    }

    #[test]
    fn rankings_are_sorted_and_signed() {
        let dir = tempfile::TempDir::new().unwrap();
        let artifact = ModelTrainer::new(dir.path().join("m.json"), TrainParams::default())
            .fit(generate_history(300, 9).unwrap())
            .unwrap();

        let r = rank_weights(&artifact, 3);
        assert!(r.riskier.len() <= 3 && r.safer.len() <= 3);
        assert!(r.riskier.windows(2).all(|w| w[0].1 >= w[1].1));
        assert!(r.safer.windows(2).all(|w| w[0].1 <= w[1].1));
        assert!(r.riskier.iter().all(|(_, w)| *w > 0.0));
        assert!(r.safer.iter().all(|(_, w)| *w < 0.0));
    }

    #[test]
    fn truncate_marks_cut() {
        assert_eq!(truncate("repay_status_1=2", 8), "repay_s.");
        assert_eq!(truncate("age", 8), "age");
    }
}
