/*
 * Copyright (C) 2023-2024 Nils Asmussen, Barkhausen Institut
 *
 * This file is part of mcugen, the project generator for RME-based
 * microcontroller systems.
 *
 * mcugen is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License version 2 as
 * published by the Free Software Foundation.
 *
 * mcugen is distributed in the hope that it will be useful, but
 * WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU
 * General Public License version 2 for more details.
 */

//! A reader for the subset of XML the project and chip descriptions use:
//! nested elements and text values, no attributes, comments, or escapes.

use crate::error::Error;

/// One element of the description tree. An element either carries a text
/// value or child elements, never both.
pub struct XmlNode {
    tag: String,
    value: String,
    children: Vec<XmlNode>,
}

impl XmlNode {
    /// Parses `text` into an element tree and returns the root element
    pub fn parse(text: &str) -> Result<XmlNode, Error> {
        let mut p = XmlParser::new(text);
        let node = p.parse_element()?;
        p.finish()?;
        Ok(node)
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn children(&self) -> &[XmlNode] {
        &self.children
    }

    /// Returns the first child with the given tag
    pub fn child(&self, tag: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.tag == tag)
    }

    /// Returns all children with the given tag, in document order
    pub fn children_named<'n>(&'n self, tag: &'n str) -> impl Iterator<Item = &'n XmlNode> {
        self.children.iter().filter(move |c| c.tag == tag)
    }
}

struct XmlParser {
    chars: Vec<char>,
    pos: usize,
}

impl XmlParser {
    fn new(xml: &str) -> Self {
        XmlParser {
            chars: xml.chars().collect(),
            pos: 0,
        }
    }

    fn get(&mut self) -> Result<char, Error> {
        if self.pos < self.chars.len() {
            let idx = self.pos;
            self.pos += 1;
            Ok(self.chars[idx])
        }
        else {
            Err(Error::XmlSyntax("unexpected end of document".to_string()))
        }
    }

    fn put(&mut self) {
        assert!(self.pos > 0);
        self.pos -= 1;
    }

    fn peek_no_ws(&mut self) -> Result<char, Error> {
        let c = self.get_no_ws()?;
        self.put();
        Ok(c)
    }

    fn get_no_ws(&mut self) -> Result<char, Error> {
        loop {
            let c = self.get()?;
            if c.is_whitespace() {
                continue;
            }
            break Ok(c);
        }
    }

    fn consume(&mut self, c: char) -> Result<(), Error> {
        let nc = self.get_no_ws()?;
        if nc != c {
            Err(Error::XmlSyntax(format!(
                "expected '{}', found '{}'",
                c, nc
            )))
        }
        else {
            Ok(())
        }
    }

    fn finish(&mut self) -> Result<(), Error> {
        while self.pos < self.chars.len() {
            if !self.chars[self.pos].is_whitespace() {
                return Err(Error::XmlSyntax(
                    "trailing content after the root element".to_string(),
                ));
            }
            self.pos += 1;
        }
        Ok(())
    }

    fn parse_tag_name(&mut self) -> Result<String, Error> {
        let mut name = String::new();
        loop {
            let c = self.get()?;
            if c == '>' || c == '/' {
                self.put();
                break;
            }
            if c.is_whitespace() {
                break;
            }
            name.push(c);
        }

        if name.is_empty() {
            Err(Error::XmlSyntax("empty tag name".to_string()))
        }
        else {
            Ok(name)
        }
    }

    fn parse_element(&mut self) -> Result<XmlNode, Error> {
        self.consume('<')?;
        let tag = self.parse_tag_name()?;

        // self-closing elements carry neither value nor children
        let nc = self.get_no_ws()?;
        if nc == '/' {
            self.consume('>')?;
            return Ok(XmlNode {
                tag,
                value: String::new(),
                children: Vec::new(),
            });
        }
        if nc != '>' {
            return Err(Error::XmlSyntax(format!(
                "expected '>' after tag '{}'",
                tag
            )));
        }

        let mut value = String::new();
        let mut children = Vec::new();
        loop {
            let c = self.get()?;
            if c == '<' {
                let n = self.get()?;
                if n == '/' {
                    let close = self.parse_tag_name()?;
                    if close != tag {
                        return Err(Error::XmlSyntax(format!(
                            "mismatched close tag '{}' for '{}'",
                            close, tag
                        )));
                    }
                    self.consume('>')?;
                    break;
                }

                self.put();
                self.put();
                if !value.trim().is_empty() {
                    return Err(Error::XmlSyntax(format!(
                        "element '{}' mixes text and child elements",
                        tag
                    )));
                }
                children.push(self.parse_element()?);
                // values between children are not part of the format
                if self.peek_no_ws()? != '<' {
                    return Err(Error::XmlSyntax(format!(
                        "element '{}' mixes text and child elements",
                        tag
                    )));
                }
            }
            else {
                value.push(c);
            }
        }

        if !children.is_empty() {
            value.clear();
        }
        Ok(XmlNode {
            tag,
            value: value.trim().to_string(),
            children,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaf_value() {
        let n = XmlNode::parse("<Name> hello </Name>").unwrap();
        assert_eq!(n.tag(), "Name");
        assert_eq!(n.value(), "hello");
        assert!(n.children().is_empty());
    }

    #[test]
    fn nested() {
        let n = XmlNode::parse("<A><B>1</B><C>2</C><B>3</B></A>").unwrap();
        assert_eq!(n.children().len(), 3);
        assert_eq!(n.child("C").unwrap().value(), "2");
        let bs: Vec<_> = n.children_named("B").map(|c| c.value()).collect();
        assert_eq!(bs, ["1", "3"]);
    }

    #[test]
    fn malformed() {
        assert!(XmlNode::parse("").is_err());
        assert!(XmlNode::parse("<").is_err());
        assert!(XmlNode::parse("<A>").is_err());
        assert!(XmlNode::parse("<A></B>").is_err());
        assert!(XmlNode::parse("<A><B></B>text</A>").is_err());
        assert!(XmlNode::parse("<A></A><A></A>").is_err());
    }
}
