//! Hashtag and mention extraction from post content
use regex::Regex;

use sorrel_federation::addresses::ActorAddress;

// Same shape as the handle regexp in sorrel_federation::addresses
const HASHTAG_RE: &str = r"(?:^|\s)#(?P<tag>\w+)";
const MENTION_RE: &str = r"(?:^|\s)@(?P<username>[\w\.-]+)@(?P<hostname>[\w\.-]+)";

/// Returns lowercased hashtags in order of first appearance
pub fn find_hashtags(content: &str) -> Vec<String> {
    let hashtag_re = Regex::new(HASHTAG_RE).expect("regexp should be valid");
    let mut tags = vec![];
    for caps in hashtag_re.captures_iter(content) {
        let tag_name = caps["tag"].to_lowercase();
        if !tags.contains(&tag_name) {
            tags.push(tag_name);
        };
    };
    tags
}

/// Returns mentioned addresses in order of first appearance
pub fn find_mentions(content: &str) -> Vec<ActorAddress> {
    let mention_re = Regex::new(MENTION_RE).expect("regexp should be valid");
    let mut mentions: Vec<ActorAddress> = vec![];
    for caps in mention_re.captures_iter(content) {
        let address = ActorAddress::new_unchecked(
            &caps["username"],
            &caps["hostname"],
        );
        if !mentions.contains(&address) {
            mentions.push(address);
        };
    };
    mentions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_hashtags() {
        let content = "Hello #world, testing #World and #rust_lang";
        let tags = find_hashtags(content);
        assert_eq!(tags, vec!["world".to_string(), "rust_lang".to_string()]);
    }

    #[test]
    fn test_find_hashtags_none() {
        let content = "no tags here, not#even this one";
        assert_eq!(find_hashtags(content).is_empty(), true);
    }

    #[test]
    fn test_find_mentions() {
        let content = "cc @alice@social.example and @bob@peer.example";
        let mentions = find_mentions(content);
        assert_eq!(mentions.len(), 2);
        assert_eq!(mentions[0].to_string(), "alice@social.example");
        assert_eq!(mentions[1].to_string(), "bob@peer.example");
    }

    #[test]
    fn test_find_mentions_short_handle() {
        // Mentions without a hostname are not resolved
        let content = "hello @alice";
        assert_eq!(find_mentions(content).is_empty(), true);
    }
}
