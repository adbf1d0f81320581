/// Extends string types with parsing helpers for the toolkit's grammars
pub trait StringExt {
    /// Split off any trailing decimal digits
    ///
    /// Useful for decomposing isotope markers like `H2` or `B10` into the
    /// element symbol and mass number.
    ///
    /// ```rust
    /// # use nxtal_utils::StringExt;
    /// assert_eq!("B10".split_trailing_digits(), ("B", "10"));
    /// assert_eq!("He".split_trailing_digits(), ("He", ""));
    /// assert_eq!("H1a".split_trailing_digits(), ("H1a", ""));
    /// ```
    fn split_trailing_digits(&self) -> (&str, &str);

    /// True if every character is drawn from `allowed`
    ///
    /// Parameter and factory names are restricted to small character sets.
    ///
    /// ```rust
    /// # use nxtal_utils::StringExt;
    /// assert!("coh_elas".contains_only("abcdefghijklmnopqrstuvwxyz_"));
    /// assert!(!"Coh_elas".contains_only("abcdefghijklmnopqrstuvwxyz_"));
    /// ```
    fn contains_only(&self, allowed: &str) -> bool;
}

impl<T: AsRef<str>> StringExt for T {
    fn split_trailing_digits(&self) -> (&str, &str) {
        let s = self.as_ref();
        let head_len = s.trim_end_matches(|c: char| c.is_ascii_digit()).len();
        s.split_at(head_len)
    }

    fn contains_only(&self, allowed: &str) -> bool {
        self.as_ref().chars().all(|c| allowed.contains(c))
    }
}
