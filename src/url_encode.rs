/// Percent-encode a URL component with the same results as JS's
/// `encodeURIComponent`, which leaves `!'()*` alone where `urlencoding` does
/// not.
pub fn encode_uri_component(component: &str) -> String {
    let encoded = urlencoding::encode(component);
    if !encoded.contains('%') {
        return encoded.into_owned();
    }
    encoded
        .replace("%21", "!")
        .replace("%27", "'")
        .replace("%28", "(")
        .replace("%29", ")")
        .replace("%2A", "*")
}

#[test]
fn test_encode_uri_component() {
    assert_eq!(encode_uri_component("nsINode"), "nsINode");
    assert_eq!(
        encode_uri_component("calls-to:'nsINode::GetParent' depth:4"),
        "calls-to%3A'nsINode%3A%3AGetParent'%20depth%3A4"
    );
    assert_eq!(encode_uri_component("_ZN1A,_ZN1B"), "_ZN1A%2C_ZN1B");
    assert_eq!(encode_uri_component("a (b)*!"), "a%20(b)*!");
}
