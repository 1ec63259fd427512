use crate::f;

/// Extends string types with useful functions
pub trait StringExt {
    /// Capitalises the first letter in a string
    ///
    /// ```rust
    /// # use egstools_utils::StringExt;
    /// assert_eq!("electron fluence".capitalise(), "Electron fluence".to_string());
    /// assert_eq!("".capitalise(), "".to_string());
    /// ```
    fn capitalise(&self) -> String;

    /// Pads every line of a block of text with a fixed indent
    ///
    /// ```rust
    /// # use egstools_utils::StringExt;
    /// assert_eq!("a\nb".indent(2), "  a\n  b".to_string());
    /// ```
    fn indent(&self, width: usize) -> String;
}

impl<T: AsRef<str>> StringExt for T {
    fn capitalise(&self) -> String {
        let mut c = self.as_ref().chars();
        match c.next() {
            Some(f) => f.to_uppercase().collect::<String>() + c.as_str(),
            None => String::new(),
        }
    }

    fn indent(&self, width: usize) -> String {
        let pad = " ".repeat(width);
        self.as_ref()
            .lines()
            .map(|line| f!("{pad}{line}"))
            .collect::<Vec<String>>()
            .join("\n")
    }
}
