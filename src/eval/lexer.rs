//! Expression tokenizer.

use super::EvalError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Tok {
    Field(String),
    Str(String),
    Num(f64),
    True,
    False,
    Null,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Not,
    LParen,
    RParen,
}

pub(crate) fn tokenize(input: &str) -> Result<Vec<Tok>, EvalError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' | '\r' | '\n' => {
                i += 1;
            }
            '(' => {
                tokens.push(Tok::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Tok::RParen);
                i += 1;
            }
            '&' => {
                if chars.get(i + 1) == Some(&'&') {
                    tokens.push(Tok::And);
                    i += 2;
                } else {
                    return Err(EvalError::UnexpectedChar(c, i));
                }
            }
            '|' => {
                if chars.get(i + 1) == Some(&'|') {
                    tokens.push(Tok::Or);
                    i += 2;
                } else {
                    return Err(EvalError::UnexpectedChar(c, i));
                }
            }
            '=' => {
                // `==` and the strict `===` alias.
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Tok::Eq);
                    i += if chars.get(i + 2) == Some(&'=') { 3 } else { 2 };
                } else {
                    return Err(EvalError::UnexpectedChar(c, i));
                }
            }
            '!' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Tok::Ne);
                    i += if chars.get(i + 2) == Some(&'=') { 3 } else { 2 };
                } else {
                    tokens.push(Tok::Not);
                    i += 1;
                }
            }
            '<' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Tok::Le);
                    i += 2;
                } else {
                    tokens.push(Tok::Lt);
                    i += 1;
                }
            }
            '>' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Tok::Ge);
                    i += 2;
                } else {
                    tokens.push(Tok::Gt);
                    i += 1;
                }
            }
            '\'' | '"' => {
                let (text, consumed) = read_string(&chars, i, c)?;
                tokens.push(Tok::Str(text));
                i += consumed;
            }
            '-' => {
                if chars.get(i + 1).is_some_and(|d| d.is_ascii_digit()) {
                    let (num, consumed) = read_number(&chars, i + 1)?;
                    tokens.push(Tok::Num(-num));
                    i += consumed + 1;
                } else {
                    return Err(EvalError::UnexpectedChar(c, i));
                }
            }
            _ if c.is_ascii_digit() => {
                let (num, consumed) = read_number(&chars, i)?;
                tokens.push(Tok::Num(num));
                i += consumed;
            }
            _ if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len()
                    && (chars[i].is_ascii_alphanumeric() || chars[i] == '_' || chars[i] == '.')
                {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                tokens.push(match word.as_str() {
                    "true" => Tok::True,
                    "false" => Tok::False,
                    "null" => Tok::Null,
                    _ => Tok::Field(word),
                });
            }
            _ => return Err(EvalError::UnexpectedChar(c, i)),
        }
    }
    Ok(tokens)
}

fn read_string(chars: &[char], start: usize, quote: char) -> Result<(String, usize), EvalError> {
    let mut text = String::new();
    let mut i = start + 1;
    while i < chars.len() {
        match chars[i] {
            '\\' => {
                let escaped = chars.get(i + 1).ok_or(EvalError::UnterminatedString)?;
                text.push(match escaped {
                    'n' => '\n',
                    't' => '\t',
                    'r' => '\r',
                    other => *other,
                });
                i += 2;
            }
            c if c == quote => return Ok((text, i - start + 1)),
            c => {
                text.push(c);
                i += 1;
            }
        }
    }
    Err(EvalError::UnterminatedString)
}

fn read_number(chars: &[char], start: usize) -> Result<(f64, usize), EvalError> {
    let mut i = start;
    let mut seen_dot = false;
    while i < chars.len() {
        match chars[i] {
            c if c.is_ascii_digit() => i += 1,
            '.' if !seen_dot && chars.get(i + 1).is_some_and(|d| d.is_ascii_digit()) => {
                seen_dot = true;
                i += 1;
            }
            _ => break,
        }
    }
    let text: String = chars[start..i].iter().collect();
    text.parse::<f64>()
        .map(|n| (n, i - start))
        .map_err(|_| EvalError::InvalidNumber(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_comparison() {
        let toks = tokenize("Status__c == 'Open'").unwrap();
        assert_eq!(
            toks,
            vec![
                Tok::Field("Status__c".into()),
                Tok::Eq,
                Tok::Str("Open".into())
            ]
        );
    }

    #[test]
    fn test_tokenize_strict_aliases() {
        assert_eq!(tokenize("a === 1").unwrap()[1], Tok::Eq);
        assert_eq!(tokenize("a !== 1").unwrap()[1], Tok::Ne);
    }

    #[test]
    fn test_tokenize_logic_and_numbers() {
        let toks = tokenize("!(Amount > 1000.5) && flag || count <= -3").unwrap();
        assert_eq!(toks[0], Tok::Not);
        assert!(toks.contains(&Tok::Num(1000.5)));
        assert!(toks.contains(&Tok::Num(-3.0)));
        assert!(toks.contains(&Tok::And));
        assert!(toks.contains(&Tok::Or));
    }

    #[test]
    fn test_tokenize_dotted_field_and_keywords() {
        let toks = tokenize("row.Account.Name != null").unwrap();
        assert_eq!(toks[0], Tok::Field("row.Account.Name".into()));
        assert_eq!(toks[2], Tok::Null);
    }

    #[test]
    fn test_tokenize_rejects_stray_characters() {
        assert!(matches!(
            tokenize("a = 1"),
            Err(EvalError::UnexpectedChar('=', _))
        ));
        assert!(matches!(
            tokenize("a & b"),
            Err(EvalError::UnexpectedChar('&', _))
        ));
        assert!(matches!(tokenize("'open"), Err(EvalError::UnterminatedString)));
    }

    #[test]
    fn test_tokenize_escaped_quotes() {
        let toks = tokenize(r#"name == 'O\'Brien'"#).unwrap();
        assert_eq!(toks[2], Tok::Str("O'Brien".into()));
    }
}
