use super::bit_mask;

/// Записывает младшие `width` бит `value` начиная с бита `offset`.
///
/// Соседние биты не затрагиваются (read-modify-write). Старшие биты
/// `value` за пределами `width` отбрасываются: проверка переполнения -
/// забота вызывающего кода.
///
/// # Panics
///
/// Если `width` не в `1..=64` или поле выходит за конец `buf`.
pub fn write_bits(
    buf: &mut [u8],
    offset: usize,
    width: u32,
    value: u64,
) {
    assert!(width > 0 && width <= 64, "bit width {width} out of 1..=64");
    assert!(
        offset + width as usize <= buf.len() * 8,
        "bits {offset}..{} past end of {}-byte buffer",
        offset + width as usize,
        buf.len()
    );

    let first = offset / 8;
    let last = (offset + width as usize - 1) / 8;
    let shift = offset % 8;

    let mut acc: u128 = 0;
    for (i, b) in buf[first..=last].iter().enumerate() {
        acc |= (*b as u128) << (8 * i);
    }

    let mask = bit_mask(width) << shift;
    acc = (acc & !mask) | (((value as u128) << shift) & mask);

    for (i, b) in buf[first..=last].iter_mut().enumerate() {
        *b = (acc >> (8 * i)) as u8;
    }
}
