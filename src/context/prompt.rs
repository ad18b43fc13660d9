use crate::language::Locale;

/// Phrase the model is told to emit when the context lacks the answer.
pub fn not_found_sentinel(locale: Locale) -> &'static str {
    match locale {
        Locale::Bengali => "প্রসঙ্গে উত্তর নেই",
        Locale::English => "Not available in the context.",
    }
}

/// Fills the locale's template. Context and query are inserted verbatim.
pub fn build_prompt(locale: Locale, context: &str, query: &str) -> String {
    let not_found = not_found_sentinel(locale);
    match locale {
        Locale::Bengali => format!(
            "প্রসঙ্গটি মনোযোগ দিয়ে পড়ুন এবং প্রশ্নের উত্তর নিজের ভাষায় স্পষ্টভাবে দিন। \n\
উত্তরটি প্রসঙ্গের তথ্যের ভিত্তিতে যুক্তিসম্মত ও সংক্ষিপ্তভাবে দিন। \n\
যদি প্রসঙ্গে উত্তর না থাকে, '{not_found}' লিখুন।\n\
\n\
প্রসঙ্গ:\n\
{context}\n\
\n\
প্রশ্ন: {query}\n\
\n\
উত্তর:"
        ),
        Locale::English => format!(
            "Read the following context carefully and answer the question in your own words, clearly and concisely in English. \n\
Base your answer on the information in the context, using reasoning if needed. \n\
If the answer is not present, reply '{not_found}'\n\
\n\
Context:\n\
{context}\n\
\n\
Question: {query}\n\
\n\
Answer:"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn english_prompt_embeds_context_and_question() {
        let prompt = build_prompt(Locale::English, "Anupom is the narrator.", "Who narrates?");
        assert!(prompt.starts_with("Read the following context carefully"));
        assert!(prompt.contains("Context:\nAnupom is the narrator.\n\nQuestion: Who narrates?\n\nAnswer:"));
        assert!(prompt.contains("reply 'Not available in the context.'"));
        assert!(prompt.ends_with("Answer:"));
    }

    #[test]
    fn bengali_prompt_uses_bengali_sentinel() {
        let prompt = build_prompt(Locale::Bengali, "প্রসঙ্গ লেখা", "কল্যাণীর বয়স কত?");
        assert!(prompt.contains("'প্রসঙ্গে উত্তর নেই' লিখুন"));
        assert!(prompt.contains("প্রসঙ্গ:\nপ্রসঙ্গ লেখা\n\nপ্রশ্ন: কল্যাণীর বয়স কত?\n\nউত্তর:"));
    }

    #[test]
    fn placeholders_inside_inputs_are_left_alone() {
        let prompt = build_prompt(Locale::English, "literal {query} and {", "q");
        assert!(prompt.contains("Context:\nliteral {query} and {\n"));
        assert!(prompt.contains("Question: q\n"));
    }
}
