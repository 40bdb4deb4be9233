/// Маска из `width` младших единичных битов (`width` ≤ 64).
pub fn bit_mask(width: u32) -> u128 {
    (1u128 << width) - 1
}

/// Читает `width` бит (≤ 64), начиная с бита `offset`.
///
/// Биты нумеруются от младшего бита байта 0, байты - little-endian, как у
/// упакованных битовых полей GCC на x86. Поле может пересекать границы
/// байтов и 64-битных слов: собираем не более 9 байт в `u128`.
///
/// # Panics
///
/// Если `width` не в `1..=64` или поле выходит за конец `buf`.
pub fn read_bits(
    buf: &[u8],
    offset: usize,
    width: u32,
) -> u64 {
    assert!(width > 0 && width <= 64, "bit width {width} out of 1..=64");
    assert!(
        offset + width as usize <= buf.len() * 8,
        "bits {offset}..{} past end of {}-byte buffer",
        offset + width as usize,
        buf.len()
    );

    let first = offset / 8;
    let last = (offset + width as usize - 1) / 8;

    let mut acc: u128 = 0;
    for (i, b) in buf[first..=last].iter().enumerate() {
        acc |= (*b as u128) << (8 * i);
    }

    ((acc >> (offset % 8)) & bit_mask(width)) as u64
}
