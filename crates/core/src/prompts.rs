/// Official example prompts offered on the page for copying into the generator.
pub const OFFICIAL_PROMPTS: [&str; 6] = [
    "A dreamy synth-pop song with female vocals in English about 'exploring the future', upbeat and positive",
    "Un morceau rap instrumental énergique avec des percussions puissantes et une ambiance urbaine nocturne",
    "Epic cinematic orchestral track, suitable for trailer, with emotional strings and bold brass, no vocals",
    "Chanson pop française, paroles sur l’été et la liberté, tempo rapide, voix féminine",
    "Latin reggaeton beat with catchy synths and rhythmic claps, vocal in Spanish, party mood",
    "Ambient chill-out instrumental with soft piano, deep bass and slow atmospheric pads",
];

const PROMPT_SEPARATOR: &str = "\n\n";

/// Text for the host to put on the clipboard, and the toast to show once the
/// write succeeded.
#[derive(uniffi::Record, Clone, Debug, PartialEq, Eq)]
pub struct PromptCopy {
    pub text: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptLibrary {
    prompts: Vec<String>,
}

impl Default for PromptLibrary {
    fn default() -> Self {
        Self::new(OFFICIAL_PROMPTS)
    }
}

impl PromptLibrary {
    pub fn new<I, S>(prompts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prompts: prompts.into_iter().map(Into::into).collect(),
        }
    }

    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }

    /// `None` when `index` is past the end of the list.
    pub fn copy_text(&self, index: usize) -> Option<PromptCopy> {
        self.prompts.get(index).map(|prompt| PromptCopy {
            text: prompt.clone(),
            message: "Prompt copié !".to_owned(),
        })
    }

    pub fn copy_all(&self) -> PromptCopy {
        PromptCopy {
            text: self.prompts.join(PROMPT_SEPARATOR),
            message: "Tous les prompts copiés !".to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn official_list() {
        let library = PromptLibrary::default();
        assert_eq!(library.prompts().len(), 6);
        assert!(library.prompts()[1].starts_with("Un morceau rap"));
    }

    #[test]
    fn copy_single_prompt() {
        let library = PromptLibrary::default();
        assert_eq!(
            library.copy_text(2),
            Some(PromptCopy {
                text: OFFICIAL_PROMPTS[2].to_owned(),
                message: "Prompt copié !".to_owned(),
            })
        );
    }

    #[test]
    fn out_of_range_index() {
        let library = PromptLibrary::default();
        assert_eq!(library.copy_text(6), None);
        assert_eq!(library.copy_text(usize::MAX), None);
    }

    #[test]
    fn copy_all_joins_with_blank_lines() {
        let library = PromptLibrary::new(["one", "two", "three"]);
        assert_eq!(
            library.copy_all(),
            PromptCopy {
                text: "one\n\ntwo\n\nthree".to_owned(),
                message: "Tous les prompts copiés !".to_owned(),
            }
        );
    }

    #[test]
    fn copy_all_of_official_list() {
        let copy = PromptLibrary::default().copy_all();
        assert_eq!(copy.text.split("\n\n").count(), OFFICIAL_PROMPTS.len());
        assert!(copy.text.ends_with("slow atmospheric pads"));
    }
}
