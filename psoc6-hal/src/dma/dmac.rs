//! DMAC channels

use super::{
    descriptor::{encode_incr, tr_type, DmacCtl, DmacIncr, Limits, Plan},
    Channel, CtlParams, EngineKind, Event, Priority,
};
use crate::{
    pac::dmac,
    triggers::{TriggerDest, TriggerSource},
};

pub(super) const LIMITS: Limits = Limits {
    max_count: 65536,
    incr_bits: 16,
};

const CTL: usize = 0;
const SRC: usize = 1;
const DST: usize = 2;
const X_SIZE: usize = 3;
const X_INCR: usize = 4;
const Y_SIZE: usize = 5;
const Y_INCR: usize = 6;
const NEXT: usize = 7;

/// One DMAC channel.
pub(super) struct DmacChannel<'a> {
    regs: &'a dmac::RegisterBlock,
    channel: u8,
}

impl<'a> DmacChannel<'a> {
    pub(super) fn new(regs: &'a dmac::RegisterBlock, channel: u8) -> Self {
        Self { regs, channel }
    }

    fn ch(&self) -> &'a dmac::Ch {
        &self.regs.ch[self.channel as usize]
    }
}

impl Channel for DmacChannel<'_> {
    fn kind(&self) -> EngineKind {
        EngineKind::Dmac
    }

    fn limits(&self) -> Limits {
        LIMITS
    }

    fn write_descriptor(&self, words: &mut [u32; 8], src: u32, dst: u32, plan: &Plan, p: &CtlParams) {
        let mut ctl = DmacCtl::from_bits(0);
        ctl.set_intr_type(tr_type::DESCR);
        ctl.set_tr_in_type(p.tr_in);
        ctl.set_tr_out_type(p.tr_out);
        ctl.set_ch_disable(p.ch_disable);
        ctl.set_src_transfer_size(p.src_word);
        ctl.set_dst_transfer_size(p.dst_word);
        ctl.set_data_size(p.data_size);
        ctl.set_descr_type(plan.descr_type);

        let mut x_incr = DmacIncr::from_bits(0);
        x_incr.set_src(encode_incr(plan.src_x, LIMITS.incr_bits));
        x_incr.set_dst(encode_incr(plan.dst_x, LIMITS.incr_bits));
        let mut y_incr = DmacIncr::from_bits(0);
        y_incr.set_src(encode_incr(plan.src_y, LIMITS.incr_bits));
        y_incr.set_dst(encode_incr(plan.dst_y, LIMITS.incr_bits));

        *words = [0; 8];
        words[CTL] = ctl.bits();
        words[SRC] = src;
        words[DST] = dst;
        words[X_SIZE] = plan.x_count - 1;
        words[X_INCR] = x_incr.bits();
        words[Y_SIZE] = plan.y_count - 1;
        words[Y_INCR] = y_incr.bits();
        words[NEXT] = p.next;
    }

    fn is_busy(&self) -> bool {
        self.regs.active.read_field(dmac::ACTIVE_ACTIVE) & (1 << self.channel) != 0
    }

    fn completion_pending(&self) -> bool {
        self.ch().intr.is_set(dmac::intr::COMPLETION.mask())
    }

    fn program(&self, descriptor: u32, priority: Priority) {
        let ch = self.ch();
        ch.ctl.write(0);
        ch.curr.write(descriptor);
        ch.idx.write(0);
        ch.intr.write(dmac::intr::ALL);
        ch.ctl
            .write(dmac::CH_CTL_PRIO.val(priority as u32) | dmac::CH_CTL_ENABLED.mask());
        self.regs.ctl.set_bits(dmac::CTL_ENABLED.mask());
    }

    fn disable(&self) {
        let ch = self.ch();
        ch.ctl.clear_bits(dmac::CH_CTL_ENABLED.mask());
        ch.intr_mask.write(0);
        ch.intr.write(dmac::intr::ALL);
    }

    fn set_intr_mask(&self, events: Event) {
        // DMAC cause bits line up with `Event`.
        self.ch().intr_mask.write(events.bits() as u32 & dmac::intr::ALL);
    }

    fn take_events(&self) -> Event {
        let ch = self.ch();
        let pending = ch.intr.read() & ch.intr_mask.read() & dmac::intr::ALL;
        if pending != 0 {
            ch.intr.write(pending);
        }
        Event::from_bits_truncate(pending as u8)
    }

    fn trigger_dest(&self) -> TriggerDest {
        TriggerDest::DmacChannel {
            channel: self.channel,
        }
    }

    fn trigger_source(&self) -> TriggerSource {
        TriggerSource::DmacDone {
            channel: self.channel,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pac;

    #[test]
    fn cause_bits_match_events() {
        assert_eq!(
            dmac::intr::COMPLETION.mask(),
            Event::TRANSFER_COMPLETE.bits() as u32
        );
        assert_eq!(
            dmac::intr::DST_MISAL.mask(),
            Event::DST_MISAL.bits() as u32
        );
        assert_eq!(
            dmac::intr::DESCR_BUS_ERROR.mask(),
            Event::DESCR_BUS_ERROR.bits() as u32
        );
        assert_eq!(dmac::intr::ALL, Event::all().bits() as u32);
    }

    #[test]
    fn busy_reads_active_mask() {
        let regs = pac::detached::<dmac::RegisterBlock>();
        let ch = DmacChannel::new(&regs, 5);
        assert!(!ch.is_busy());
        regs.active.write(1 << 4);
        assert!(!ch.is_busy());
        regs.active.write(1 << 5);
        assert!(ch.is_busy());
    }

    #[test]
    fn take_events_applies_mask() {
        let regs = pac::detached::<dmac::RegisterBlock>();
        let ch = DmacChannel::new(&regs, 2);
        regs.ch[2].intr.write(
            dmac::intr::COMPLETION.mask() | dmac::intr::SRC_BUS_ERROR.mask(),
        );
        ch.set_intr_mask(Event::TRANSFER_COMPLETE);
        assert_eq!(ch.take_events(), Event::TRANSFER_COMPLETE);
    }

    #[test]
    fn descriptor_words() {
        let regs = pac::detached::<dmac::RegisterBlock>();
        let ch = DmacChannel::new(&regs, 0);
        let plan = Plan {
            descr_type: super::super::descriptor::descr_type::TWO_D,
            x_count: 16,
            y_count: 4,
            src_x: 1,
            dst_x: -1,
            src_y: 16,
            dst_y: -16,
        };
        let params = CtlParams {
            tr_in: tr_type::X_LOOP,
            tr_out: tr_type::DESCR,
            ch_disable: true,
            src_word: false,
            dst_word: true,
            data_size: 2,
            next: 0,
        };
        let mut words = [0xdead_beef; 8];
        ch.write_descriptor(&mut words, 0x100, 0x200, &plan, &params);

        let ctl = DmacCtl::from_bits(words[CTL]);
        assert_eq!(ctl.descr_type(), 2);
        assert_eq!(ctl.tr_in_type(), tr_type::X_LOOP);
        assert_eq!(ctl.data_size(), 2);
        assert!(ctl.ch_disable());
        assert!(ctl.dst_transfer_size());
        assert!(!ctl.src_transfer_size());
        assert_eq!(words[X_SIZE], 15);
        assert_eq!(words[Y_SIZE], 3);
        assert_eq!(DmacIncr::from_bits(words[X_INCR]).dst(), 0xffff);
        assert_eq!(DmacIncr::from_bits(words[Y_INCR]).dst(), 0xfff0);
        assert_eq!(words[NEXT], 0);
    }
}
