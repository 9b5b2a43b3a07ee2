//! Built-in emergency questions, used when no bank question is playable.

use crate::game::question::{Difficulty, Language, Question};

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// The compiled-in question set. Always valid and bilingual.
pub fn emergency_questions() -> Vec<Question> {
    vec![
        Question::new(
            "emergency-1",
            "How many days are in a week?",
            strings(&["5", "6", "7", "8"]),
            2,
            Difficulty::Easy,
        )
        .with_category("general")
        .with_translation(Language::Ar, "كم عدد أيام الأسبوع؟", strings(&["٥", "٦", "٧", "٨"])),
        Question::new(
            "emergency-2",
            "Which planet is known as the Red Planet?",
            strings(&["Venus", "Mars", "Jupiter", "Saturn"]),
            1,
            Difficulty::Easy,
        )
        .with_category("science")
        .with_translation(
            Language::Ar,
            "أي كوكب يعرف بالكوكب الأحمر؟",
            strings(&["الزهرة", "المريخ", "المشتري", "زحل"]),
        ),
        Question::new(
            "emergency-3",
            "What is the largest ocean on Earth?",
            strings(&["Atlantic", "Indian", "Arctic", "Pacific"]),
            3,
            Difficulty::Medium,
        )
        .with_category("geography")
        .with_translation(
            Language::Ar,
            "ما هو أكبر محيط على الأرض؟",
            strings(&["الأطلسي", "الهندي", "المتجمد الشمالي", "الهادئ"]),
        ),
        Question::new(
            "emergency-4",
            "What is 12 x 12?",
            strings(&["124", "144", "132", "148"]),
            1,
            Difficulty::Medium,
        )
        .with_category("math")
        .with_translation(Language::Ar, "كم يساوي ١٢ × ١٢؟", strings(&["١٢٤", "١٤٤", "١٣٢", "١٤٨"])),
        Question::new(
            "emergency-5",
            "Which gas do plants absorb from the air?",
            strings(&["Oxygen", "Nitrogen", "Carbon dioxide", "Helium"]),
            2,
            Difficulty::Hard,
        )
        .with_category("science")
        .with_translation(
            Language::Ar,
            "ما الغاز الذي تمتصه النباتات من الهواء؟",
            strings(&["الأكسجين", "النيتروجين", "ثاني أكسيد الكربون", "الهيليوم"]),
        ),
        Question::new(
            "emergency-6",
            "In which continent is Egypt?",
            strings(&["Asia", "Africa", "Europe", "South America"]),
            1,
            Difficulty::Easy,
        )
        .with_category("geography")
        .with_translation(
            Language::Ar,
            "في أي قارة تقع مصر؟",
            strings(&["آسيا", "أفريقيا", "أوروبا", "أمريكا الجنوبية"]),
        ),
    ]
}
