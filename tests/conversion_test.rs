//! Integration tests for whole document conversion.

mod common;

use anyhow::Result;
use common::{REPO_URL, gitea, trac};
use pretty_assertions::assert_eq;
use regex::Regex;
use tracdown::markdown::disguise_code_blocks;
use tracdown::{Converter, DocumentContext, LinkGuard};

fn wiki(text: &str) -> Result<String> {
    let (source, destination) = (trac(), gitea());
    Converter::new(&source, &destination).convert_wiki_text("SandBox", text)
}

fn ticket(text: &str) -> Result<String> {
    let (source, destination) = (trac(), gitea());
    Converter::new(&source, &destination).convert_ticket_text(1, text)
}

#[test]
fn test_single_line_code_block() -> Result<()> {
    assert_eq!(
        wiki("before {{{this is some code}}} after")?,
        "before `this is some code` after"
    );
    Ok(())
}

#[test]
fn test_inline_code_between_words() -> Result<()> {
    assert_eq!(wiki("a{{{code}}}b")?, "a`code`b");
    assert_eq!(ticket("a{{{code}}}b")?, "a`code`b");
    Ok(())
}

#[test]
fn test_unknown_processor_kept() -> Result<()> {
    assert_eq!(wiki("{{{#!python\nx=1\n}}}")?, "```#!python\nx=1\n```");
    Ok(())
}

#[test]
fn test_multi_line_block_keeps_processor() -> Result<()> {
    // Arrange
    let text = "intro\n{{{#!processor\ncode one\ncode two\n}}}\noutro";

    // Act
    let result = wiki(text)?;

    // Assert
    assert_eq!(result, "intro\n```#!processor\ncode one\ncode two\n```\noutro");
    Ok(())
}

#[test]
fn test_processor_on_next_line() -> Result<()> {
    assert_eq!(
        wiki("{{{\n#!processor with spaces\ntext\n}}}\n")?,
        "```#!processor with spaces\ntext\n```\n"
    );
    Ok(())
}

#[test]
fn test_language_blocks() -> Result<()> {
    assert_eq!(wiki("{{{#!cpp\nint x;\n}}}")?, "```cpp\nint x;\n```");
    assert_eq!(wiki("{{{\n#!c++\nint x;\n}}}")?, "```cpp\nint x;\n```");
    assert_eq!(wiki("{{{#!py\nx = 1\n}}}")?, "```py\nx = 1\n```");
    Ok(())
}

#[test]
fn test_commit_ticket_reference_dropped() -> Result<()> {
    // Arrange
    let text = "{{{#!CommitTicketReference repository=\"\" revision=\"4574\"\nRemove it\n}}}\n";

    // Act
    let result = ticket(text)?;

    // Assert
    assert_eq!(result, "```\nRemove it\n```\n");
    Ok(())
}

#[test]
fn test_html_block_passed_through() -> Result<()> {
    // Arrange
    let text = "{{{#!html\n<strong>ticket:2 stays</strong>\n}}}\nafter";

    // Act
    let result = wiki(text)?;

    // Assert
    assert_eq!(result, "\n<strong>ticket:2 stays</strong>\n\nafter");
    Ok(())
}

#[test]
fn test_html_tag_with_params() -> Result<()> {
    assert_eq!(
        wiki("{{{#!div id=\"test\"\ntext\n}}}\n")?,
        "<div id=\"test\">\n\ntext\n\n</div>\n"
    );
    Ok(())
}

#[test]
fn test_nested_html_tags() -> Result<()> {
    // Arrange
    let text = "{{{#!table\n\t{{{#!tr\n\t\t{{{#!td\ncell\n\t\t}}}\n\t}}}\n}}}\n";

    // Act
    let result = wiki(text)?;

    // Assert
    assert_eq!(
        result,
        "<table>\n\n\t<tr>\n\n\t\t<td>\n\ncell\n\t\t\n</td>\n\t\n</tr>\n\n</table>\n"
    );
    Ok(())
}

#[test]
fn test_comment_block() -> Result<()> {
    assert_eq!(
        wiki("{{{#!comment\nhidden text\n}}}\n")?,
        "<!---\nhidden text\n-->\n"
    );
    Ok(())
}

#[test]
fn test_no_conversion_inside_code_block() -> Result<()> {
    // Arrange
    let body = "Website: http://www.example.com\n[wiki:WikiStart wiki link] //italics//\n";
    let text = format!("{{{{{{#!processor\n{}}}}}}}\n", body);

    // Act
    let result = wiki(&text)?;

    // Assert
    assert_eq!(result, format!("```#!processor\n{}```\n", body));
    Ok(())
}

#[test]
fn test_conversion_inside_html_tag() -> Result<()> {
    // Arrange
    let text = "{{{#!td\nWebsite: http://www.example.com\n[wiki:WikiStart wiki link] here\n}}}\n";

    // Act
    let result = wiki(text)?;

    // Assert
    assert_eq!(
        result,
        "<td>\n\nWebsite: <http://www.example.com>\n[wiki link](Home) here\n\n</td>\n"
    );
    Ok(())
}

#[test]
fn test_lone_closer_kept() -> Result<()> {
    assert_eq!(wiki("a }}} b")?, "a }}} b");
    Ok(())
}

#[test]
fn test_empty_input() -> Result<()> {
    assert_eq!(wiki("")?, "");
    assert_eq!(ticket("")?, "");
    Ok(())
}

#[test]
fn test_nested_pairs_balance() {
    for depth in 1..=6 {
        // Arrange
        let text = format!("{}body{}", "{{{\n".repeat(depth), "\n}}}".repeat(depth));

        // Act
        let disguised = disguise_code_blocks(&text);

        // Assert
        assert!(disguised.is_balanced(), "depth {} should balance", depth);
        assert_eq!(disguised.as_str().matches("{@{@{").count(), depth);
        assert_eq!(disguised.as_str().matches("}@}@}").count(), depth);
        assert!(!disguised.as_str().contains("{{{"));
        assert!(!disguised.as_str().contains("}}}"));
    }
}

#[test]
fn test_conversion_is_deterministic() -> Result<()> {
    // Arrange
    let text = "WikiStart, ticket:2, comment:2 and [[Image(shot.png)]]\n{{{\ncode\n}}}\n";

    // Act
    let first = ticket(text)?;
    let second = ticket(text)?;

    // Assert
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn test_ticket_links() -> Result<()> {
    assert_eq!(ticket("see ticket:2")?, format!("see <{}/issues/12>", REPO_URL));
    assert_eq!(ticket("[ticket:2]")?, format!("<{}/issues/12>", REPO_URL));
    Ok(())
}

#[test]
fn test_unresolved_links_fall_back_per_occurrence() -> Result<()> {
    // Arrange
    let text = "ticket:99 and ticket:2 and ticket:99999999999999999999";

    // Act
    let result = ticket(text)?;

    // Assert
    assert_eq!(
        result,
        format!(
            "ticket:99 and <{}/issues/12> and ticket:99999999999999999999",
            REPO_URL
        )
    );
    Ok(())
}

#[test]
fn test_comment_links() -> Result<()> {
    let expected = format!("<{}/issues/11#issuecomment-30>", REPO_URL);

    assert_eq!(ticket("comment:2")?, expected);
    assert_eq!(wiki("comment:2:ticket:1")?, expected);
    assert_eq!(ticket("comment:3")?, "comment:3", "Zero time should be a miss");
    assert_eq!(wiki("comment:2")?, "comment:2", "Wiki has no current ticket");
    Ok(())
}

#[test]
fn test_milestone_link() -> Result<()> {
    assert_eq!(
        ticket("due milestone:1.0 soon")?,
        format!("due <{}/milestone/3> soon", REPO_URL)
    );
    assert_eq!(ticket("milestone:2.0")?, "milestone:2.0");
    Ok(())
}

#[test]
fn test_attachment_links() -> Result<()> {
    assert_eq!(
        ticket("attachment:log.txt")?,
        "<https://git.example.com/attachments/abc-123>"
    );
    assert_eq!(
        wiki("attachment:shot.png:ticket:1")?,
        "<https://git.example.com/attachments/def-456>"
    );
    assert_eq!(
        ticket("attachment:diagram.png:wiki:SandBox")?,
        "[../../wiki/raw/attachments/SandBox/diagram.png](../../wiki/raw/attachments/SandBox/diagram.png)"
    );
    assert_eq!(ticket("attachment:missing.txt")?, "attachment:missing.txt");
    Ok(())
}

#[test]
fn test_attachment_defaults_to_current_wiki_page() -> Result<()> {
    assert_eq!(
        wiki("attachment:a.png")?,
        "[../../wiki/raw/attachments/SandBox/a.png](../../wiki/raw/attachments/SandBox/a.png)"
    );
    Ok(())
}

#[test]
fn test_failed_link_suffix_not_resolved_alone() -> Result<()> {
    assert_eq!(ticket("comment:9:ticket:2")?, "comment:9:ticket:2");
    assert_eq!(
        ticket("attachment:missing.txt:ticket:2")?,
        "attachment:missing.txt:ticket:2"
    );
    Ok(())
}

#[test]
fn test_failed_link_kept_among_resolved_ones() -> Result<()> {
    // Arrange
    let text = "ticket:2, comment:9:ticket:2 and attachment:missing.txt:ticket:2 then WikiStart";

    // Act
    let result = ticket(text)?;

    // Assert
    assert_eq!(
        result,
        format!(
            "<{}/issues/12>, comment:9:ticket:2 and attachment:missing.txt:ticket:2 then [Home](Home)",
            REPO_URL
        )
    );
    Ok(())
}

#[test]
fn test_changeset_and_source_links() -> Result<()> {
    assert_eq!(
        ticket("changeset:\"abc123/repo\"")?,
        format!("<{}/commit/abc123>", REPO_URL)
    );
    assert_eq!(
        ticket("source:\"trunk/src/main.c\"")?,
        format!("<{}/src/branch/master/src/main.c>", REPO_URL)
    );
    Ok(())
}

#[test]
fn test_htdocs_link_copies_file() -> Result<()> {
    // Arrange
    let (source, destination) = (trac(), gitea());
    let converter = Converter::new(&source, &destination);

    // Act
    let result = converter.convert_wiki_text("SandBox", "htdocs:img/logo.png")?;

    // Assert
    assert_eq!(
        result,
        "[../../wiki/raw/htdocs/img/logo.png](../../wiki/raw/htdocs/img/logo.png)"
    );
    assert_eq!(
        destination.copies.borrow().as_slice(),
        &[(
            std::path::PathBuf::from("/trac/htdocs/img/logo.png"),
            "htdocs/img/logo.png".to_string()
        )]
    );
    Ok(())
}

#[test]
fn test_htdocs_copy_failure_is_fatal() {
    // Arrange
    let source = trac();
    let mut destination = gitea();
    destination.fail_copies = true;
    let converter = Converter::new(&source, &destination);

    // Act
    let result = converter.convert_wiki_text("SandBox", "htdocs:img/logo.png");

    // Assert
    assert!(result.is_err(), "Copy failure should abort conversion");
}

#[test]
fn test_wiki_links() -> Result<()> {
    assert_eq!(wiki("See WikiStart now")?, "See [Home](Home) now");
    assert_eq!(
        wiki("wiki:SandBox#intro")?,
        "[SandBox#intro](SandBox#intro)"
    );
    assert_eq!(wiki("[[WikiStart|home page]]")?, "[home page](Home)");
    assert_eq!(wiki("[wiki:WikiStart the start]")?, "[the start](Home)");
    Ok(())
}

#[test]
fn test_camel_case_inside_word_ignored() -> Result<()> {
    assert_eq!(wiki("xWikiStart")?, "xWikiStart");
    Ok(())
}

#[test]
fn test_http_links() -> Result<()> {
    assert_eq!(
        wiki("Visit https://example.com/a.")?,
        "Visit <https://example.com/a>."
    );
    assert_eq!(
        wiki("[https://example.com the site]")?,
        "[the site](https://example.com)"
    );
    Ok(())
}

#[test]
fn test_line_break_macro_untouched() -> Result<()> {
    assert_eq!(wiki("line[[br]]next")?, "line[[br]]next");
    Ok(())
}

#[test]
fn test_images() -> Result<()> {
    assert_eq!(
        wiki("[[Image(diagram.png)]]")?,
        "![](attachments/SandBox/diagram.png)"
    );
    assert_eq!(
        ticket("[[Image(shot.png)]]")?,
        "![](https://git.example.com/attachments/def-456)"
    );
    assert_eq!(
        wiki("[[Image(https://example.com/logo.png, link=https://example.com)]]")?,
        "[![](https://example.com/logo.png)](https://example.com)"
    );
    Ok(())
}

#[test]
fn test_guarded_transform_keeps_urls() -> Result<()> {
    // Arrange
    let italics = |text: &str| {
        let re = Regex::new(r"//([^/\n]+)//").expect("Valid regex");
        re.replace_all(text, "*${1}*").into_owned()
    };
    let (source, destination) = (trac(), gitea());
    let converter = Converter::new(&source, &destination).with_transform(LinkGuard(italics));

    // Act
    let result = converter.convert(
        &DocumentContext::Wiki("SandBox".to_string()),
        "//see// https://example.com/a and http://example.org/b",
    )?;

    // Assert
    assert_eq!(
        result,
        "*see* <https://example.com/a> and <http://example.org/b>"
    );
    Ok(())
}

#[test]
fn test_output_renders_as_markdown() -> Result<()> {
    // Arrange
    let markdown = ticket("See ticket:2 and {{{code}}}")?;

    // Act
    let html = comrak::markdown_to_html(&markdown, &comrak::Options::default());

    // Assert
    assert!(
        html.contains(&format!("<a href=\"{}/issues/12\">", REPO_URL)),
        "Autolink should render: {}",
        html
    );
    assert!(html.contains("<code>code</code>"));
    Ok(())
}
