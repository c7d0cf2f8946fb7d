/// Replace characters that common filesystems reject with look-alikes.
pub fn escape(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            ':' => ',',
            '"' => '\'',
            '/' | '\\' | '|' | '?' => '!',
            '*' => '+',
            c => c,
        })
        .collect()
}
