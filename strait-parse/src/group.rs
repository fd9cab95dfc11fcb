/// Coarse, state-independent vocabulary subsets. Each tag is a pure
/// predicate over token text; a filtering harness partitions its vocabulary
/// by these once, then uses parser hints to rule whole partitions in or out
/// without speculative feeding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenGroup {
	/// Every token.
	All,

	/// No token. The default hint of all parsers.
	Empty,

	/// Tokens containing no decimal digit.
	NonNumeric,

	/// Tokens that cannot occur inside any decimal literal: two or more
	/// periods, or a period mixed with non-digit characters.
	InvalidFloat,

	/// Tokens whose first character is neither JSON punctuation, a quote,
	/// a digit, nor a period.
	BeginWithNonJsonChar,

	/// Tokens free of quote and backslash characters, always appendable
	/// inside a string body.
	NoQuoteChar,

	/// Tokens consisting solely of decimal digits.
	Numeric,

	/// Tokens whose first character is neither alphanumeric nor `_`, so
	/// they can never extend an identifier-like literal.
	NonAlnum,
}

impl TokenGroup {
	pub const ALL_GROUPS: [TokenGroup; 8] = [
		TokenGroup::All,
		TokenGroup::Empty,
		TokenGroup::NonNumeric,
		TokenGroup::InvalidFloat,
		TokenGroup::BeginWithNonJsonChar,
		TokenGroup::NoQuoteChar,
		TokenGroup::Numeric,
		TokenGroup::NonAlnum,
	];

	pub fn contains(&self, token: &str) -> bool {
		match self {
			TokenGroup::All => true,
			TokenGroup::Empty => false,
			TokenGroup::NonNumeric => !token.chars().any(|c| c.is_ascii_digit()),
			TokenGroup::InvalidFloat => {
				token.matches('.').count() >= 2 || (token.contains('.') && token.chars().any(|c| !c.is_ascii_digit() && c != '.'))
			}
			TokenGroup::BeginWithNonJsonChar => match token.chars().next() {
				None => true,
				Some(c) => !c.is_ascii_digit() && !matches!(c, '{' | '}' | '[' | ']' | '"' | ',' | ':' | '.'),
			},
			TokenGroup::NoQuoteChar => !token.contains('"') && !token.contains('\\'),
			TokenGroup::Numeric => !token.is_empty() && token.chars().all(|c| c.is_ascii_digit()),
			TokenGroup::NonAlnum => match token.chars().next() {
				None => true,
				Some(c) => !c.is_alphanumeric() && c != '_',
			},
		}
	}
}
