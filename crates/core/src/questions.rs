//! Lesson question catalogs and transcript→question-index detection.
//!
//! The catalogs are configuration data consumed by the pipeline. Index
//! detection is the compatibility fallback for transports that do not emit a
//! structured advancement signal: it fuzzy-matches the tutor's spoken
//! transcript against the known question list.

use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use std::ops::RangeInclusive;

/// The single-track conversation lesson, in order. 1-based indexing at the
/// API surface.
pub const SIMPLE_CONVERSATION_QUESTIONS: [&str; 52] = [
    "Hi, I'm your conversation partner from The Language School. What is your name?",
    "It's nice to meet you. How are you?",
    "I am from the United States. Where are you from?",
    "I have been to Spain, Argentina, Chile, Ecuador, Cuba, the Dominican Republic, Mexico, Colombia, Uruguay, and Bolivia. Do you like to travel?",
    "Where do you live?",
    "I am an English teacher. Where do you work?",
    "I like to cook. Do you like to cook?",
    "I like to play drums. Do you like to play an instrument?",
    "I like to ride bikes. Do you like to ride bikes?",
    "I like to go to the gym. Do you like to go to the gym?",
    "I like to practice yoga. Do you like to practice yoga?",
    "I like to read. Do you like to read?",
    "I like to watch movies. Do you like to watch movies?",
    "I like to dance salsa. Do you like to dance?",
    "Do you like to study?",
    "Do you like American food?",
    "Do you like Mexican food?",
    "Do you like Italian food?",
    "Do you like beer?",
    "Do you like wine?",
    "Do you like cocktails?",
    "Do you like soccer?",
    "Do you like football?",
    "Do you like baseball?",
    "What does computer mean in Spanish?",
    "What does office mean?",
    "What does paper mean?",
    "What does employee mean?",
    "What does director mean?",
    "What does student mean?",
    "What does conference room mean?",
    "What does classroom mean?",
    "How do you say computadora in English?",
    "How do you say oficina?",
    "How do you say papel?",
    "How do you say empleado?",
    "How do you say director?",
    "How do you say estudiante?",
    "How do you say salón de conferencia?",
    "How do you say salón de clase?",
    "How much does a piece of paper cost?",
    "How much does a pen cost?",
    "How much does a pencil cost?",
    "How much does a marker cost?",
    "How much does a package of paper cost?",
    "How much does a box of pencils cost?",
    "How much does a box of pens cost?",
    "How much does a box of markers cost?",
    "How much does an English book cost?",
    "How much does a whiteboard cost?",
    "What is your telephone number?",
    "Let's stay in touch. Take care!",
];

pub const TOTAL_QUESTIONS: u32 = SIMPLE_CONVERSATION_QUESTIONS.len() as u32;

/// The translation block ("What does … mean?") where Spanish answers are
/// expected and English ones trip the guardrail.
pub const WHAT_DOES_RANGE: RangeInclusive<u32> = 25..=32;

/// English words a student is likely to answer with during the translation
/// block; seeing one means they answered in the wrong language.
pub const KNOWN_ENGLISH_ANSWERS: [&str; 16] = [
    "computer",
    "computers",
    "office",
    "offices",
    "paper",
    "papers",
    "employee",
    "employees",
    "director",
    "directors",
    "student",
    "students",
    "conference room",
    "classroom",
    "it means",
    "means",
];

/// One part of the multi-part lesson.
#[derive(Debug, Clone, Copy)]
pub struct Lesson2Part {
    pub part_number: u32,
    pub name: &'static str,
    pub questions: &'static [&'static str],
}

pub const LESSON_2_PARTS: [Lesson2Part; 8] = [
    Lesson2Part {
        part_number: 1,
        name: "Making Friends",
        questions: &[
            "What is your name?",
            "Where are you from?",
            "Where do you live?",
            "Where do you work?",
            "What do you like?",
            "Do you like to go to the movies?",
            "Do you like to go to the theater?",
            "Do you like to go to museums?",
            "Do you like to go to concerts?",
            "Do you like to go to the mountains?",
            "Do you like to go to the beach?",
            "Do you like to go to the park?",
            "Do you like to go shopping?",
            "Do you like to listen to music?",
            "Do you like to listen to the radio?",
            "Do you like to listen to the news?",
            "Do you like to listen to audiobooks?",
            "Do you like to take pictures?",
            "Do you like to take English classes?",
            "Do you like coffee?",
            "Do you like beer?",
            "Do you like soda?",
            "Do you like wine?",
            "Do you like water?",
            "Do you like chicken?",
            "Do you like steak?",
            "Do you like pork?",
            "Do you like fish?",
            "Do you like to ski?",
            "Do you like to snowboard?",
            "Do you like to play sports?",
            "Do you like soccer?",
            "Do you like football?",
            "Do you like TV, Netflix, or YouTube?",
            "What is your telephone number?",
            "Let's stay in touch!",
            "Take care!",
        ],
    },
    Lesson2Part {
        part_number: 2,
        name: "Vocabulary Practice: People",
        questions: &[
            "How do you say \"el hermano\" in English?",
            "How do you say \"la hermana\" in English?",
            "How do you say \"los hermanos\" in English?",
            "How do you say \"las hermanas\" in English?",
            "How do you say \"los hermanos y las hermanas\" (palabra neutral) in English?",
            "How do you say \"el padre\" in English?",
            "How do you say \"la madre\" in English?",
            "How do you say \"los padres\" in English?",
            "How do you say \"las madres\" in English?",
            "How do you say \"los padres y las madres\" (palabra neutral) in English?",
            "How do you say \"el hijo\" in English?",
            "How do you say \"la hija\" in English?",
            "How do you say \"los hijos\" in English?",
            "How do you say \"las hijas\" in English?",
            "How do you say \"los hijos y las hijas\" (palabra neutral) in English?",
            "How do you say \"el estudiante\" in English?",
            "How do you say \"la estudiante\" in English?",
            "How do you say \"los estudiantes\" in English?",
            "How do you say \"las estudiantes\" in English?",
            "How do you say \"los estudiantes y las estudiantes\" (palabra neutral) in English?",
            "How do you say \"el maestro\" in English?",
            "How do you say \"la maestra\" in English?",
            "How do you say \"los maestros\" in English?",
            "How do you say \"las maestras\" in English?",
            "How do you say \"los maestros y las maestras\" (palabra neutral) in English?",
            "How do you say \"el hombre\" in English?",
            "How do you say \"la mujer\" in English?",
            "How do you say \"los hombres\" in English?",
            "How do you say \"las mujeres\" in English?",
            "How do you say \"los hombres y las mujeres\" (palabra neutral) in English?",
        ],
    },
    Lesson2Part {
        part_number: 3,
        name: "Vocabulary Practice: Classroom Objects",
        questions: &[
            "How do you say \"el lápiz\" in English?",
            "How do you say \"los lápices\" in English?",
            "How do you say \"el papel\" in English?",
            "How do you say \"los papeles\" in English?",
            "How do you say \"el libro\" in English?",
            "How do you say \"los libros\" in English?",
            "How do you say \"el bolígrafo\" in English?",
            "How do you say \"los bolígrafos\" in English?",
            "How do you say \"la pizarra\" in English?",
            "How do you say \"las pizarras\" in English?",
            "How do you say \"la clase\" in English?",
            "How do you say \"las clases\" in English?",
            "How do you say \"la silla\" in English?",
            "How do you say \"las sillas\" in English?",
            "How do you say \"el marcador\" in English?",
            "How do you say \"los marcadores\" in English?",
            "How do you say \"el caramelo\" in English?",
            "How do you say \"los caramelos\" in English?",
            "How do you say \"la mochila\" in English?",
            "How do you say \"las mochilas\" in English?",
        ],
    },
    Lesson2Part {
        part_number: 4,
        name: "Role Play: Shopping",
        questions: &[
            "SCENARIO 1: You need to buy el lápiz ($0.10) and el libro ($9). Hi! How are you?",
            "The pencil costs ten cents.",
            "The book costs nine dollars.",
            "Thanks! Bye.",
            "SCENARIO 2: You need to buy el bolígrafo ($1) and el paquete de papel ($2). Hi! How are you?",
            "The pen costs one dollar.",
            "The pack of paper costs two dollars.",
            "Thanks! Bye.",
            "SCENARIO 3: You need to buy el marcador ($3) and la pizarra ($10). Hi! How are you?",
            "The marker costs three dollars.",
            "The whiteboard costs ten dollars.",
            "Thanks! Bye.",
        ],
    },
    Lesson2Part {
        part_number: 5,
        name: "Relevance (Personalization)",
        questions: &[
            "Cuando estás aprendiendo hablar otro idioma ¡tiene que hacerlo relevante! ¿A qué te dedicas? / What do you do for work?",
            "[Generate 10 most frequently used nouns based on student's job]",
            "¿Qué haces para divertirte? / What do you do for fun?",
            "[Generate 10 most frequently used nouns based on student's hobbies]",
        ],
    },
    Lesson2Part {
        part_number: 6,
        name: "Practicing Numbers",
        questions: &[
            "How many books are there? (6)",
            "How many pens are there? (8)",
            "How many whiteboards are there? (1)",
            "How many pencils are there? (10)",
            "How many markers are there? (7)",
            "How many plants are there? (5)",
            "How many students are there? (4)",
            "How many teachers are there? (1)",
            "How many erasers are there? (2)",
            "How many pencil sharpeners are there? (3)",
            "How many pieces of paper are there? (10)",
            "How many notebooks are there? (12)",
            "How many cell phones are there?",
            "How many bottles of water are there? (11)",
            "How much does a cheeseburger cost? ($13)",
            "How much does a Harry Potter book cost? ($14)",
            "How much does a t-shirt cost? ($15)",
            "How much does a pair of movie tickets cost? ($16)",
            "How much does a pizza cost? ($17)",
            "How much does a board game cost? ($18)",
            "How much does a baseball hat cost? ($18)",
        ],
    },
    Lesson2Part {
        part_number: 7,
        name: "Practicing Colors",
        questions: &[
            "What color is the pencil? (Amarillo)",
            "What color is the door? (Marrón)",
            "What color is the book? (Rojo)",
            "What color is the window? (Blanco)",
            "What color is the table? (Marrón)",
            "What color is the whiteboard? (Blanco)",
            "What color is the plant? (Verde)",
            "What color is the chair? (Negro)",
            "What color is the marker? (Anaranjado)",
            "What color is the telephone? (Negro)",
            "What color is the dog? (Gris)",
            "What color is the rose? (Rosado)",
        ],
    },
    Lesson2Part {
        part_number: 8,
        name: "Making Small Talk",
        questions: &[
            "Do you like pizza?",
            "Do you like tigers?",
            "Do you like James Bond movies?",
            "Do you like beer?",
            "Do you prefer beer or wine?",
            "Do you like snow?",
            "Do you like Colorado?",
            "Do you like Mexican food?",
            "Do you like the beach?",
            "Do you like the guitar?",
            "Do you like the spring?",
            "Do you like the summer?",
            "Do you like the fall?",
            "Do you like the winter?",
            "What is your favorite food?",
            "What is your favorite animal?",
            "What is your favorite movie genre?",
            "What is your favorite drink?",
            "What is your favorite state?",
            "What is your favorite dish?",
            "What is your favorite sport?",
            "What is your favorite place?",
            "What is your favorite instrument?",
            "What is your favorite weather?",
        ],
    },
];

/// Looks up a single-track question by its 1-based index.
pub fn question_by_index(index: u32) -> Option<&'static str> {
    if index < 1 || index > TOTAL_QUESTIONS {
        return None;
    }
    Some(SIMPLE_CONVERSATION_QUESTIONS[(index - 1) as usize])
}

pub fn lesson2_part(part_number: u32) -> Option<&'static Lesson2Part> {
    LESSON_2_PARTS.iter().find(|p| p.part_number == part_number)
}

/// Looks up a multi-part question by part number and 1-based index within
/// the part.
pub fn lesson2_question(part_number: u32, question_index: u32) -> Option<&'static str> {
    let part = lesson2_part(part_number)?;
    if question_index < 1 || question_index > part.questions.len() as u32 {
        return None;
    }
    Some(part.questions[(question_index - 1) as usize])
}

pub fn lesson2_part_question_count(part_number: u32) -> u32 {
    lesson2_part(part_number).map_or(0, |p| p.questions.len() as u32)
}

pub fn lesson2_part_count() -> u32 {
    LESSON_2_PARTS.len() as u32
}

/// Whether the question at `index` belongs to the translation block.
pub fn is_what_does_question(index: u32) -> bool {
    WHAT_DOES_RANGE.contains(&index)
}

/// Whether a student answer to a translation question looks like English
/// instead of the expected Spanish.
pub fn looks_like_english_answer(text: &str) -> bool {
    let normalized = normalize(text);
    if normalized.chars().count() < 2 {
        return false;
    }
    if text.chars().any(|c| "áéíóúñü¿¡".contains(c)) {
        return false;
    }
    KNOWN_ENGLISH_ANSWERS.iter().any(|word| normalized.contains(word))
}

fn normalize(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter(|c| !"?.!,¿¡\"".contains(*c))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Words shorter than this carry no signal for the overlap heuristic.
const OVERLAP_MIN_WORD_LEN: usize = 4;
/// Fraction of a question's significant words that must appear in the
/// transcript for an overlap match.
const OVERLAP_THRESHOLD: f64 = 0.7;

/// Detects which catalog question a tutor transcript corresponds to.
///
/// Two passes over the catalog, cheapest first. Pass one looks for substring
/// containment in either direction, so an exactly spoken question always
/// beats a looser match. Pass two scores every question by the fraction of
/// its significant words present in the transcript (with a per-word fuzzy
/// tier that tolerates transcription artifacts such as extra characters
/// inside a word) and picks the best question at or above the threshold.
/// Returns the 1-based index, or `None` when nothing in the catalog matches.
pub fn find_question_index(text: &str) -> Option<u32> {
    let normalized_text = normalize(text);
    if normalized_text.is_empty() {
        return None;
    }

    for (i, raw_question) in SIMPLE_CONVERSATION_QUESTIONS.iter().enumerate() {
        let question = normalize(raw_question);
        if normalized_text.contains(&question) || question.contains(&normalized_text) {
            return Some(i as u32 + 1);
        }
    }

    let matcher = SkimMatcherV2::default();
    let transcript_words: Vec<&str> = normalized_text.split_whitespace().collect();

    // (index, ratio, matched word count): ties on ratio go to the question
    // with more matched evidence.
    let mut best: Option<(u32, f64, usize)> = None;
    for (i, raw_question) in SIMPLE_CONVERSATION_QUESTIONS.iter().enumerate() {
        let question = normalize(raw_question);
        let question_words: Vec<&str> = question
            .split_whitespace()
            .filter(|w| w.chars().count() >= OVERLAP_MIN_WORD_LEN)
            .collect();
        if question_words.is_empty() {
            continue;
        }

        let matching = question_words
            .iter()
            .filter(|word| {
                normalized_text.contains(*word)
                    || transcript_words.iter().any(|tw| {
                        tw.len() > word.len() && matcher.fuzzy_match(tw, word).is_some()
                    })
            })
            .count();

        let ratio = matching as f64 / question_words.len() as f64;
        if ratio >= OVERLAP_THRESHOLD
            && best.is_none_or(|(_, best_ratio, best_matched)| {
                ratio > best_ratio || (ratio == best_ratio && matching > best_matched)
            })
        {
            best = Some((i as u32 + 1, ratio, matching));
        }
    }

    best.map(|(index, _, _)| index)
}

/// The silent context block appended to the tutor preamble so the realtime
/// assistant stays pinned to the current question.
pub fn silent_context(question_index: u32) -> String {
    let current_question = question_by_index(question_index).unwrap_or_default();
    format!(
        "\n[SYSTEM BLOCK]\n- YOU ARE CURRENTLY RESTRICTED TO QUESTION NUMBER: {question_index}\n- EXACT QUESTION TEXT: \"{current_question}\"\n- If the student is correct, your ONLY task is to remain SILENT and wait for the system to give you the next question.\n- DO NOT say \"Nice to meet you\" or \"Great\".\n- DO NOT invent questions about \"free time\".\n- If you are correcting, use the algorithm and then ask ONLY: \"{current_question}\".\n[END BLOCK]\n"
    )
}

/// The instruction pushed over the transport after an advance.
pub fn strict_order_instruction(question_index: u32, question: &str) -> String {
    format!(
        "STRICT ORDER: You are on question {question_index}. Ask ONLY: \"{question}\". No small talk."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_indexing_is_one_based() {
        assert!(question_by_index(0).is_none());
        assert_eq!(
            question_by_index(1),
            Some("Hi, I'm your conversation partner from The Language School. What is your name?")
        );
        assert_eq!(question_by_index(52), Some("Let's stay in touch. Take care!"));
        assert!(question_by_index(53).is_none());
    }

    #[test]
    fn what_does_range_covers_the_translation_block() {
        assert!(!is_what_does_question(24));
        assert!(is_what_does_question(25));
        assert!(question_by_index(25).unwrap().starts_with("What does computer"));
        assert!(is_what_does_question(32));
        assert!(question_by_index(32).unwrap().starts_with("What does classroom"));
        assert!(!is_what_does_question(33));
    }

    #[test]
    fn english_answer_detection() {
        assert!(looks_like_english_answer("computer"));
        assert!(looks_like_english_answer("It means office."));
        // Spanish characters mean a Spanish attempt.
        assert!(!looks_like_english_answer("computadora"));
        assert!(!looks_like_english_answer("¡computer!"));
        assert!(!looks_like_english_answer("a"));
    }

    #[test]
    fn exact_transcript_matches_its_question() {
        assert_eq!(find_question_index("Do you like soccer?"), Some(22));
    }

    #[test]
    fn transcript_with_preamble_still_matches() {
        assert_eq!(
            find_question_index("Okay. I like to cook. Do you like to cook?"),
            Some(7)
        );
    }

    #[test]
    fn partial_question_matches_by_containment() {
        // The tutor only spoke a fragment of the catalog entry.
        assert_eq!(find_question_index("do you like to travel"), Some(4));
    }

    #[test]
    fn word_overlap_tolerates_paraphrase() {
        // No exact fragment of the catalog entry, so this resolves through
        // the word-overlap pass; the whiteboard question has the most
        // matched evidence among the "How much does…" entries.
        assert_eq!(
            find_question_index("How much money does the whiteboard cost?"),
            Some(50)
        );
    }

    #[test]
    fn unrelated_text_matches_nothing() {
        assert_eq!(find_question_index("the weather in montevideo is lovely today"), None);
        assert_eq!(find_question_index(""), None);
        assert_eq!(find_question_index("?!"), None);
    }

    #[test]
    fn lesson2_lookup() {
        assert_eq!(lesson2_question(1, 1), Some("What is your name?"));
        assert_eq!(lesson2_question(1, 37), Some("Take care!"));
        assert!(lesson2_question(1, 38).is_none());
        assert!(lesson2_question(9, 1).is_none());
        assert_eq!(lesson2_part_question_count(4), 12);
        assert_eq!(lesson2_part_count(), 8);
    }

    #[test]
    fn silent_context_pins_the_current_question() {
        let block = silent_context(7);
        assert!(block.contains("QUESTION NUMBER: 7"));
        assert!(block.contains("Do you like to cook?"));
    }

    #[test]
    fn strict_order_instruction_quotes_the_question() {
        let instruction = strict_order_instruction(8, "Do you like to play an instrument?");
        assert!(instruction.starts_with("STRICT ORDER: You are on question 8."));
        assert!(instruction.contains("\"Do you like to play an instrument?\""));
    }
}
