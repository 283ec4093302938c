//! System prompts

/// Forces the rigid reply format the extractor expects. The `City:` /
/// `Year: …, Murder Count: …` labels are the wire contract between the model
/// and `extract::extract_city_tables`; do not reword them.
pub const STATS_SYSTEM_PROMPT: &str = r#"You are an assistant.
Please return only the murder statistics for each city in the following structured format:

City: <city name>
Year: <year>, Murder Count: <number>

Repeat this format for each year and each city.
Do not include any additional text or explanations.
"#;
