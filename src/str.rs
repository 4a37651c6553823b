pub trait XmlStr {
    /// Find the end of the quoted attribute value, not including the quote
    fn end_of_attribute(&self, quote: char) -> Option<usize>;
    /// Find the end of an unquoted attribute value
    fn end_of_unquoted_attribute(&self) -> usize;
    /// Find the end of a run of character data
    fn end_of_char_data(&self) -> usize;
    /// Find the end of the CDATA section, not including the ]]>
    fn end_of_cdata(&self) -> Option<usize>;
    /// Find the end of the comment, not including the -->
    fn end_of_comment(&self) -> Option<usize>;
    /// Find the end of the doctype declaration, not including the >
    fn end_of_doctype(&self) -> Option<usize>;
    /// Find the end of the processing instruction, not including the ?>
    fn end_of_pi_value(&self) -> Option<usize>;
    fn end_of_name(&self) -> usize;
    fn end_of_space(&self) -> usize;
}

impl<'a> XmlStr for &'a str {
    fn end_of_attribute(&self, quote: char) -> Option<usize> {
        self.find(quote)
    }

    fn end_of_unquoted_attribute(&self) -> usize {
        self.find(|c: char| c.is_space_char() || c == '>')
            .unwrap_or(self.len())
    }

    fn end_of_char_data(&self) -> usize {
        self.find('<').unwrap_or(self.len())
    }

    fn end_of_cdata(&self) -> Option<usize> {
        self.find("]]>")
    }

    fn end_of_comment(&self) -> Option<usize> {
        self.find("-->")
    }

    fn end_of_doctype(&self) -> Option<usize> {
        let mut in_subset = false;
        let mut quote = None;
        let mut offset = 0;

        while let Some(c) = self[offset..].chars().next() {
            let rest = &self[offset..];

            // Comments and PIs in the internal subset may hold stray quotes.
            if in_subset && quote.is_none() {
                if let Some(comment) = rest.strip_prefix("<!--") {
                    offset += "<!--".len() + comment.end_of_comment()? + "-->".len();
                    continue;
                }
                if let Some(pi) = rest.strip_prefix("<?") {
                    offset += "<?".len() + pi.end_of_pi_value()? + "?>".len();
                    continue;
                }
            }

            match (quote, c) {
                (Some(q), c) if q == c => quote = None,
                (Some(_), _) => {}
                (None, '"') | (None, '\'') => quote = Some(c),
                (None, '[') => in_subset = true,
                (None, ']') => in_subset = false,
                (None, '>') if !in_subset => return Some(offset),
                _ => {}
            }
            offset += c.len_utf8();
        }

        None
    }

    fn end_of_pi_value(&self) -> Option<usize> {
        self.find("?>")
    }

    fn end_of_name(&self) -> usize {
        self.find(|c: char| !c.is_name_char()).unwrap_or(self.len())
    }

    fn end_of_space(&self) -> usize {
        self.find(|c: char| !c.is_space_char()).unwrap_or(self.len())
    }
}

pub trait XmlChar {
    fn is_name_char(self) -> bool;
    fn is_space_char(self) -> bool;
}

impl XmlChar for char {
    // Looser than the XML Name production.
    fn is_name_char(self) -> bool {
        match self {
            '_' | '-' | '.' | ':' => true,
            c => c.is_alphanumeric(),
        }
    }

    fn is_space_char(self) -> bool {
        match self {
            '\x20' |
            '\x09' |
            '\x0D' |
            '\x0A' => true,
            _ => false,
        }
    }
}
