// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! `lokascript languages`: list the language tables.

use lokascript_core::semantic::{Direction, LanguageInfo, WordOrder, supported_languages};
use miette::{IntoDiagnostic, Result};

pub fn run() -> Result<()> {
    let languages = supported_languages().into_diagnostic()?;
    for language in &languages {
        println!("{}", format_language(language));
    }
    Ok(())
}

fn format_language(language: &LanguageInfo) -> String {
    let direction = match language.direction {
        Direction::Ltr => "ltr",
        Direction::Rtl => "rtl",
    };
    let order = match language.word_order {
        WordOrder::Svo => "SVO",
        WordOrder::Sov => "SOV",
        WordOrder::Vso => "VSO",
    };
    format!(
        "{:<4} {:<12} {:<12} {direction} {order}{}",
        language.code.as_str(),
        language.name.as_str(),
        language.native_name.as_str(),
        if language.spacing { "" } else { " unspaced" }
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arabic_line() {
        let languages = supported_languages().unwrap();
        let arabic = languages.iter().find(|l| l.code == "ar").unwrap();
        let line = format_language(arabic);
        assert!(line.starts_with("ar   Arabic"), "{line}");
        assert!(line.contains("rtl VSO"), "{line}");
    }

    #[test]
    fn test_japanese_is_unspaced() {
        let languages = supported_languages().unwrap();
        let japanese = languages.iter().find(|l| l.code == "ja").unwrap();
        assert!(format_language(japanese).ends_with("ltr SOV unspaced"));
    }
}
