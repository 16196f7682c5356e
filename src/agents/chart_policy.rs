// Keyword rules that turn a question into chart or report regeneration

use crate::analysis::charts::ChartKind;

/// Checked in order; the first phrase found in the lowercased question wins.
const CHART_KEYWORDS: &[(&str, ChartKind)] = &[
    ("bmi distribution", ChartKind::BmiHistogram),
    ("height vs weight", ChartKind::HeightWeightScatter),
    ("gender distribution", ChartKind::GenderDistribution),
    ("bmi by gender", ChartKind::BmiBoxplot),
];

pub fn chart_for_question(question: &str) -> Option<ChartKind> {
    let question = question.to_lowercase();
    CHART_KEYWORDS
        .iter()
        .find(|(phrase, _)| question.contains(phrase))
        .map(|(_, kind)| *kind)
}

/// True when "report" or "reports" appears as a whole word
pub fn wants_report(question: &str) -> bool {
    question
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| word == "report" || word == "reports")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords_are_case_insensitive() {
        assert_eq!(chart_for_question("Show the BMI Distribution"), Some(ChartKind::BmiHistogram));
        assert_eq!(chart_for_question("plot height vs weight"), Some(ChartKind::HeightWeightScatter));
        assert_eq!(chart_for_question("gender distribution?"), Some(ChartKind::GenderDistribution));
        assert_eq!(chart_for_question("BMI by gender"), Some(ChartKind::BmiBoxplot));
        assert_eq!(chart_for_question("height versus weight"), None);
    }

    #[test]
    fn test_first_match_wins() {
        assert_eq!(
            chart_for_question("bmi by gender and the bmi distribution"),
            Some(ChartKind::BmiHistogram)
        );
    }

    #[test]
    fn test_wants_report() {
        assert!(wants_report("Give me a Report"));
        assert!(wants_report("report: bmi by gender"));
        assert!(wants_report("any reports?"));
        assert!(!wants_report("summary please"));
    }

    #[test]
    fn test_report_needs_whole_word() {
        assert!(!wants_report("who is the reporter"));
        assert!(!wants_report("cases reported last year"));
        assert!(!wants_report("unreported income"));
        assert!(!wants_report("self-reporting bias"));
    }
}
